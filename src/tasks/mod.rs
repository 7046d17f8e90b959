//! Recurring background jobs.
//!
//! Call `spawn_all` once during startup; tasks are detached with `tokio::spawn`.

use crate::services::AuthService;

const OTP_PURGE_INTERVAL_SECS: u64 = 10 * 60;

/// Spawn all background tasks.
pub fn spawn_all(auth_service: AuthService) {
    // expired verification codes
    {
        let svc = auth_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.purge_expired_otps().await {
                    Ok(n) if n > 0 => log::info!("Expired OTP codes purged: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to purge expired OTP codes: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(OTP_PURGE_INTERVAL_SECS)).await;
            }
        });
    }
}
