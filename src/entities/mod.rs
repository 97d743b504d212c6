// ABOUTME: SeaORM entities module for database models and relationships
// ABOUTME: Exports entity definitions for users, movie references, favorites, and ratings

pub mod favorite;
pub mod movie;
pub mod rating;
pub mod user;
