use std::time::Duration;

use actix_web::web;
use log::*;
use pdv_engine::CartStore;
use tokio::task::JoinHandle;

pub const CART_PURGE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Starts the abandoned cart worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_cart_worker(carts: web::Data<CartStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Abandoned cart worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running abandoned cart job");
            match carts.purge_expired() {
                Ok(0) => {},
                Ok(n) => info!("🕰️ {n} abandoned carts discarded. {} carts remain", carts.len()),
                Err(e) => error!("🕰️ Error running abandoned cart job: {e}"),
            }
        }
    })
}
