use crate::entities::todo;
use async_trait::async_trait;

pub mod api;
pub mod store;

#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct Todo {
    id: String,
    text: String,
    completed: bool,
    completed_at: Option<i64>,
}

impl Todo {
    pub fn new(id: String, text: String, completed: bool, completed_at: Option<i64>) -> Self {
        Self {
            id,
            text,
            completed,
            completed_at,
        }
    }

    /// Returns the ID assigned by the store.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the todo text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether the todo has been completed.
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the completion time in epoch milliseconds, if completed.
    pub fn completed_at(&self) -> Option<i64> {
        self.completed_at
    }
}

impl From<todo::Model> for Todo {
    fn from(model: todo::Model) -> Self {
        Todo::new(
            model.id.to_string(),
            model.text,
            model.completed,
            model.completed_at,
        )
    }
}

/// Fields a client may change on an existing todo. Absent fields are left untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TodoUpdate {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

/// Validated column changes handed to a [`TodoStore`].
///
/// `completed_at` is `Some(None)` when the timestamp has to be cleared.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TodoChanges {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub completed_at: Option<Option<i64>>,
}

impl TodoChanges {
    /// Validates an update and derives the completion timestamp from `completed`.
    ///
    /// # Arguments
    ///
    /// * `update` - The fields sent by the client.
    /// * `now_millis` - The current time in epoch milliseconds.
    pub fn from_update(update: TodoUpdate, now_millis: i64) -> Result<Self, TodoError> {
        let text = update.text.as_deref().map(validate_text).transpose()?;
        let completed_at = update
            .completed
            .map(|completed| completed.then_some(now_millis));

        Ok(Self {
            text,
            completed: update.completed,
            completed_at,
        })
    }

    /// Returns true when nothing would be written.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.completed.is_none() && self.completed_at.is_none()
    }
}

/// Error type for todo operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    /// The request carried missing or malformed fields.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// The supplied id does not match the store's id encoding.
    #[error("Invalid todo id: {0}")]
    InvalidId(String),
    /// No todo exists with the supplied id.
    #[error("Todo with id {0} not found")]
    NotFound(String),
    /// Represents a database error.
    #[error("Storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),
}

/// Storage capability behind the todo routes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Syntactic check that `id` matches the store's id encoding. Does not hit the database.
    fn is_valid_id(&self, id: &str) -> bool;

    /// Persists a new, uncompleted todo and returns it with its assigned id.
    async fn create(&self, text: String) -> Result<Todo, TodoError>;

    /// Returns every stored todo, in no particular order.
    async fn find_all(&self) -> Result<Vec<Todo>, TodoError>;

    /// Looks up a todo, `None` when no row has this id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, TodoError>;

    /// Removes a todo, returning it as it was before deletion.
    async fn delete_by_id(&self, id: &str) -> Result<Option<Todo>, TodoError>;

    /// Applies `changes` and returns the updated todo.
    async fn update_by_id(&self, id: &str, changes: TodoChanges)
    -> Result<Option<Todo>, TodoError>;
}

pub struct TodoService<'a> {
    store: &'a dyn TodoStore,
}

impl TodoService<'_> {
    pub fn new(store: &dyn TodoStore) -> TodoService<'_> {
        TodoService { store }
    }

    /// Creates a new todo.
    ///
    /// # Arguments
    ///
    /// * `text` - The todo text; surrounding whitespace is trimmed.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Todo`, or a validation error if the text is missing or blank.
    #[tracing::instrument(skip(self))]
    pub async fn create_todo(&self, text: Option<String>) -> Result<Todo, TodoError> {
        let text = text.ok_or_else(|| TodoError::Validation("text is required".to_string()))?;
        let text = validate_text(&text)?;
        self.store.create(text).await
    }

    /// Retrieves all todos.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_todos(&self) -> Result<Vec<Todo>, TodoError> {
        self.store.find_all().await
    }

    /// Retrieves a todo by its ID.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Todo`, `InvalidId` for a malformed id or `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn get_todo_by_id(&self, id: &str) -> Result<Todo, TodoError> {
        self.ensure_valid_id(id)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| TodoError::NotFound(id.to_string()))
    }

    /// Deletes a todo by its ID.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `Todo`, `InvalidId` for a malformed id or `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_todo_by_id(&self, id: &str) -> Result<Todo, TodoError> {
        self.ensure_valid_id(id)?;
        self.store
            .delete_by_id(id)
            .await?
            .ok_or_else(|| TodoError::NotFound(id.to_string()))
    }

    /// Applies a partial update to a todo.
    ///
    /// Completing a todo stamps `completed_at` with the current time, un-completing it clears the stamp.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the todo to update.
    /// * `update` - The fields to change.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Todo` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn update_todo_by_id(&self, id: &str, update: TodoUpdate) -> Result<Todo, TodoError> {
        self.ensure_valid_id(id)?;
        let changes = TodoChanges::from_update(update, now_millis())?;
        self.store
            .update_by_id(id, changes)
            .await?
            .ok_or_else(|| TodoError::NotFound(id.to_string()))
    }

    pub(crate) fn ensure_valid_id(&self, id: &str) -> Result<(), TodoError> {
        if self.store.is_valid_id(id) {
            Ok(())
        } else {
            Err(TodoError::InvalidId(id.to_string()))
        }
    }
}

/// Trims `text` and rejects it when nothing is left.
fn validate_text(text: &str) -> Result<String, TodoError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TodoError::Validation("text must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
