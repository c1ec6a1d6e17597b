use crate::entities::todo;
use crate::todo::{Todo, TodoChanges, TodoError, TodoStore};
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr, EntityTrait};
use std::sync::Arc;
use uuid::Uuid;

/// [`TodoStore`] backed by a SeaORM connection. Ids are UUIDs.
#[derive(Clone, Debug)]
pub struct SeaOrmTodoStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmTodoStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: &str) -> Result<Option<todo::Model>, TodoError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        Ok(todo::Entity::find_by_id(id).one(self.db.as_ref()).await?)
    }
}

#[async_trait]
impl TodoStore for SeaOrmTodoStore {
    fn is_valid_id(&self, id: &str) -> bool {
        Uuid::parse_str(id).is_ok()
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, text: String) -> Result<Todo, TodoError> {
        let active_model = todo::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            text: ActiveValue::Set(text),
            completed: ActiveValue::Set(false),
            completed_at: ActiveValue::Set(None),
        };
        let created_model = active_model.insert(self.db.as_ref()).await?;
        Ok(Todo::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Todo>, TodoError> {
        let todos = todo::Entity::find()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Todo::from)
            .collect();
        Ok(todos)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, TodoError> {
        Ok(self.find_model(id).await?.map(Todo::from))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> Result<Option<Todo>, TodoError> {
        let Some(todo_to_delete) = self.find_model(id).await? else {
            return Ok(None);
        };

        // A concurrent delete may have removed the row since it was read.
        let delete_result = todo::Entity::delete_by_id(todo_to_delete.id)
            .exec(self.db.as_ref())
            .await?;
        if delete_result.rows_affected == 0 {
            return Ok(None);
        }
        Ok(Some(Todo::from(todo_to_delete)))
    }

    #[tracing::instrument(skip(self))]
    async fn update_by_id(
        &self,
        id: &str,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, TodoError> {
        let Some(todo_to_update) = self.find_model(id).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(Todo::from(todo_to_update)));
        }

        let mut active_model: todo::ActiveModel = todo_to_update.into();
        if let Some(text) = changes.text {
            active_model.text = ActiveValue::Set(text);
        }
        if let Some(completed) = changes.completed {
            active_model.completed = ActiveValue::Set(completed);
        }
        if let Some(completed_at) = changes.completed_at {
            active_model.completed_at = ActiveValue::Set(completed_at);
        }
        match active_model.update(self.db.as_ref()).await {
            Ok(updated_model) => Ok(Some(Todo::from(updated_model))),
            // The row was deleted between the read and the write.
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
