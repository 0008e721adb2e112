// Weekly timetable registration with schedule conflict detection

use crate::catalog::Catalog;
use crate::error::{CourseError, CourseResult, Entity};
use crate::models::{ClassRecord, TimetableEntry, TimetableView};
use crate::record::next_id;
use crate::store::{RecordStore, delete_record};
use tracing::{debug, info};

pub struct TimetableManager<'a, S: RecordStore> {
    store: &'a S,
    catalog: &'a Catalog,
}

impl<'a, S: RecordStore> TimetableManager<'a, S> {
    pub fn new(store: &'a S, catalog: &'a Catalog) -> Self {
        Self { store, catalog }
    }

    /// Put a class on the user's timetable.
    ///
    /// Validation runs in a fixed order and stops at the first failure:
    ///
    /// 1. the class must exist (`NotFound(Class)`)
    /// 2. the user must not already have this class (`AlreadyRegistered`)
    /// 3. none of the user's classes may share its day and period (`TimeConflict`)
    ///
    /// Steps 2 and 3 run against the snapshot held under the timetable's
    /// writer lock, so two registrations for the same user cannot both pass.
    pub fn register(&self, user_id: u64, class_id: u64) -> CourseResult<TimetableEntry> {
        let Some(class) = self.catalog.get_by_id(class_id) else {
            debug!(user_id, class_id, "Registration rejected: class not found");
            return Err(CourseError::NotFound(Entity::Class));
        };

        self.store.transact(|entries: &mut Vec<TimetableEntry>| -> CourseResult<TimetableEntry> {
            check_duplicate(entries, user_id, class_id)?;
            self.check_slot(entries, user_id, class)?;

            let entry = TimetableEntry {
                id: next_id(entries),
                user_id,
                class_id,
            };
            entries.push(entry.clone());

            info!(id = entry.id, user_id, class_id, "Registered class on timetable");
            Ok(entry)
        })
    }

    /// The user's timetable joined with class data; entries whose class is gone are left out
    pub fn list(&self, user_id: u64) -> CourseResult<Vec<TimetableView>> {
        let entries = self.store.load::<TimetableEntry>()?;

        let views = entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| {
                self.catalog.get_by_id(e.class_id).map(|class| TimetableView {
                    timetable_id: e.id,
                    class: class.clone(),
                })
            })
            .collect();

        Ok(views)
    }

    pub fn delete(&self, timetable_id: u64) -> CourseResult<()> {
        delete_record::<TimetableEntry, S>(self.store, timetable_id, Entity::Timetable)
    }

    // An existing entry whose class no longer resolves means the stored data
    // is inconsistent; that is reported instead of being skipped.
    fn check_slot(&self, entries: &[TimetableEntry], user_id: u64, class: &ClassRecord) -> CourseResult<()> {
        for entry in entries.iter().filter(|e| e.user_id == user_id) {
            let Some(existing) = self.catalog.get_by_id(entry.class_id) else {
                debug!(
                    user_id,
                    class_id = entry.class_id,
                    "Registration rejected: class not found"
                );
                return Err(CourseError::NotFound(Entity::Class));
            };

            if existing.slot() == class.slot() {
                debug!(
                    user_id,
                    class_id = class.id,
                    conflict_with = existing.id,
                    "Registration rejected: time conflict"
                );
                return Err(CourseError::TimeConflict {
                    conflict_with: existing.summary(),
                });
            }
        }

        Ok(())
    }
}

fn check_duplicate(entries: &[TimetableEntry], user_id: u64, class_id: u64) -> CourseResult<()> {
    if entries.iter().any(|e| e.user_id == user_id && e.class_id == class_id) {
        debug!(user_id, class_id, "Registration rejected: already registered");
        return Err(CourseError::AlreadyRegistered);
    }
    Ok(())
}
