// Entity Models
// The roster is a list of CharacterRecords keyed by (name, realm).

pub mod character;

pub use character::{CharacterRecord, WEEKLY_FIELDS};
