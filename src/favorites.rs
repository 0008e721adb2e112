// Favorite classes per user

use crate::catalog::Catalog;
use crate::error::{CourseError, CourseResult, Entity};
use crate::models::{Favorite, FavoriteView};
use crate::record::next_id;
use crate::store::{RecordStore, delete_record};
use tracing::{debug, info};

pub struct FavoriteManager<'a, S: RecordStore> {
    store: &'a S,
    catalog: &'a Catalog,
}

impl<'a, S: RecordStore> FavoriteManager<'a, S> {
    pub fn new(store: &'a S, catalog: &'a Catalog) -> Self {
        Self { store, catalog }
    }

    /// The user's favorites joined with their classes.
    ///
    /// Favorites whose class is missing from the catalog are left out.
    pub fn list(&self, user_id: u64) -> CourseResult<Vec<FavoriteView>> {
        let favorites = self.store.load::<Favorite>()?;

        let views = favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter_map(|f| {
                self.catalog.get_by_id(f.class_id).map(|class| FavoriteView {
                    favorite_id: f.id,
                    class: class.clone(),
                })
            })
            .collect();

        Ok(views)
    }

    /// Favorite a class. The class id is not checked against the catalog.
    pub fn create(&self, user_id: u64, class_id: u64) -> CourseResult<Favorite> {
        self.store.transact(|favorites: &mut Vec<Favorite>| {
            if favorites.iter().any(|f| f.user_id == user_id && f.class_id == class_id) {
                debug!(user_id, class_id, "Favorite rejected: already favorited");
                return Err(CourseError::AlreadyFavorited);
            }

            let favorite = Favorite {
                id: next_id(favorites),
                user_id,
                class_id,
            };
            favorites.push(favorite.clone());

            info!(id = favorite.id, user_id, class_id, "Created favorite");
            Ok(favorite)
        })
    }

    pub fn delete(&self, favorite_id: u64) -> CourseResult<()> {
        delete_record::<Favorite, S>(self.store, favorite_id, Entity::Favorite)
    }
}
