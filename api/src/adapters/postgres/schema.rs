//! Schema bootstrap
//!
//! Creates the ledger tables from the SeaORM entities when they are missing.
//! Order matters: referenced tables come before the tables pointing at them.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};

use crate::entity::{
    activities, activity_participants, audit_logs, expense_participants, expenses, payments,
    users,
};

pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut tables = [
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(activities::Entity),
        schema.create_table_from_entity(activity_participants::Entity),
        schema.create_table_from_entity(expenses::Entity),
        schema.create_table_from_entity(expense_participants::Entity),
        schema.create_table_from_entity(payments::Entity),
        schema.create_table_from_entity(audit_logs::Entity),
    ];

    for table in tables.iter_mut() {
        table.if_not_exists();
        db.execute(backend.build(&*table)).await?;
    }

    tracing::info!("Database schema ready");
    Ok(())
}
