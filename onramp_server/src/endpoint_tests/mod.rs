mod helpers;
mod mocks;
mod orders;
mod prices;
mod webhooks;
