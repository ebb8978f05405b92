use crate::data::Repositories;
use crate::domain::category::Category;
use crate::domain::error::DomainError;
use crate::domain::location::Location;

/// Read-only access to the administrator-managed reference lists.
#[derive(Clone)]
pub struct CatalogService {
    repos: Repositories,
}

impl CatalogService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        self.repos.categories.list_published().await
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, DomainError> {
        self.repos.locations.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn categories_are_published_and_sorted_by_description() {
        let repos = Repositories::in_memory(Arc::new(InMemoryStore::new()));
        for (title, description, slug, published) in [
            ("Food", "Recipes", "food", true),
            ("Travel", "Journeys", "travel", true),
            ("Drafts", "Archive", "drafts", false),
        ] {
            repos
                .categories
                .create(Category {
                    is_published: published,
                    ..Category::new(title.into(), description.into(), slug.into())
                })
                .await
                .unwrap();
        }
        for name in ["Rome", "Oslo"] {
            repos.locations.create(Location::new(name.into())).await.unwrap();
        }

        let catalog = CatalogService::new(repos);
        let slugs: Vec<String> = catalog
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(slugs, vec!["travel", "food"]);

        let names: Vec<String> = catalog
            .list_locations()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Oslo", "Rome"]);
    }
}
