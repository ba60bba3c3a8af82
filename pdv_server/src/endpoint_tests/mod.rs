mod auth;
mod carts;
mod helpers;
mod mocks;
mod notifications;
mod products;
