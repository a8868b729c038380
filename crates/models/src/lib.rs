pub mod errors;
pub mod db;
pub mod record;
pub mod schema;

pub mod amenity;
pub mod city;
pub mod place;
pub mod review;
pub mod state;
pub mod user;
