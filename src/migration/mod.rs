// ABOUTME: SeaORM migration module for database schema management
// ABOUTME: Runs at startup so every deployment has the users, movies, favorites, and ratings tables

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20261016_000001_create_initial_tables::Migration)]
    }
}

pub mod m20261016_000001_create_initial_tables;
