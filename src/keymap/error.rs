use thiserror::Error;

/// Errors returned by keymap registration and lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("group, shortcut or input state already exists with name '{path}'")]
    DuplicateName { path: String },

    #[error("invalid name '{0}': names must not be blank or contain '/'")]
    InvalidName(String),

    #[error("no group at path '{0}'")]
    GroupNotFound(String),

    #[error("no shortcut at path '{0}'")]
    ShortcutNotFound(String),

    #[error("no input state at path '{0}'")]
    InputStateNotFound(String),

    #[error("input state '{state}' already belongs to state manager '{manager}'")]
    StateAlreadyManaged { state: String, manager: String },
}
