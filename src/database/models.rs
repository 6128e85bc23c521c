use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Value object stored in the `accounts.details` JSON column.
///
/// Earlier variants of this benchmark kept the same payload as an opaque text
/// column and deserialized it in application code; the set-based bulk
/// operations instead reach into the column with a JSON-path predicate, so the
/// field names here are part of the storage contract.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AccountDetails {
    pub is_premium: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

// --- Accounts ---
pub mod account {
    use super::*;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "accounts")]
    #[serde(rename_all = "camelCase")]
    #[schema(as = Account)]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[schema(value_type = AccountDetails)]
        pub details: Json,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::blog::Entity")]
        Blog,
    }

    impl Related<super::blog::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Blog.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Blogs ---
pub mod blog {
    use super::*;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "blogs")]
    #[serde(rename_all = "camelCase")]
    #[schema(as = Blog)]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(indexed)]
        pub name: String,
        pub account_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::account::Entity",
            from = "Column::AccountId",
            to = "super::account::Column::Id"
        )]
        Account,
        #[sea_orm(has_many = "super::post::Entity")]
        Post,
    }

    impl Related<super::account::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Account.def()
        }
    }

    impl Related<super::post::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Post.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Posts ---
pub mod post {
    use super::*;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "posts")]
    #[serde(rename_all = "camelCase")]
    #[schema(as = Post)]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub blog_id: i32,
        pub title: String,
        #[sea_orm(column_type = "Text")]
        pub content: String,
        #[schema(value_type = String, format = DateTime)]
        pub published_on: DateTimeUtc,
        pub archived: bool,
        pub banner: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::blog::Entity",
            from = "Column::BlogId",
            to = "super::blog::Column::Id"
        )]
        Blog,
    }

    impl Related<super::blog::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Blog.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
