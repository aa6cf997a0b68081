//! Structural diff and patch for game data entities.
//!
//! Each editable entity has an [`EditableType`]: an ordered table of
//! properties, each bound to an editor for its shape (scalar, nested
//! object, list, dictionary or optional). Diffing two entities yields a
//! [`DiffNode`] tree that names only what changed; applying it to the old
//! entity yields the new one. Editors can also apply single
//! [`FieldEdit`]s addressed by a [`FieldPath`].
//!
//! An [`EntityRepository`] holds a working copy of one entity set, applies
//! diffs to it and writes it back to the registry on commit.

mod diff;
mod editable_type;
mod models;
mod path;
mod property;
mod repository;

pub use diff::{DictionaryEditNode, DiffNode, ListEditNode};
pub use editable_type::{object, Editable, EditableType, EditableTypeBuilder};
pub use path::{FieldEdit, FieldPath, FieldPathSegment};
pub use property::{
    dictionary, list, optional, scalar, DictionaryEditor, EditableProperty, ListEditor,
    OptionalEditor, Property, ScalarEditor, SharedEditor, ValueEditor,
};
pub use repository::EntityRepository;
