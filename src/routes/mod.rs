// ABOUTME: HTTP handlers for the movie catalog, user accounts, favorites, and ratings
// ABOUTME: Each handler authorizes the caller, validates input, then calls into Storage

pub mod movies;
pub mod ratings;
pub mod users;
