// SeaORM entities for the two tables the chat backend owns.

pub mod message;
pub mod topic;


pub mod prelude {
    pub use super::message::{
        ActiveModel as MessageActiveModel, Column as MessageColumn, Entity as Message,
        Model as MessageModel,
    };
    pub use super::topic::{
        ActiveModel as TopicActiveModel, Column as TopicColumn, Entity as Topic,
        Model as TopicModel,
    };

    // Re-export commonly used SeaORM types and traits
    pub use sea_orm::{
        ActiveModelTrait,
        ActiveValue,

        ColumnTrait,
        ConnectionTrait,

        // Database and connection types
        Database,
        DatabaseConnection,
        DbConn,
        DbErr,

        // Core traits
        EntityTrait,
        ModelTrait,
        NotSet,
        PaginatorTrait,
        QueryFilter,
        QueryOrder,
        Related,
        // Query builders
        Select,
        // Active model helpers
        Set,
        TransactionTrait,
        Unchanged,
    };
}
