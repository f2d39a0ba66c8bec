// src/utils/delay.rs

//! Randomised pauses and human-like typing.

use rand::Rng;
use tokio::time::sleep;

use crate::browser::Browser;
use crate::error::Result;
use crate::models::{DelayConfig, DelayRange, ms};

/// Pick a value from an inclusive range.
pub fn pick(range: DelayRange) -> u64 {
    let DelayRange(min, max) = range;
    if min >= max {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}

/// Sleep for a random duration within `range`.
pub async fn random_delay(range: DelayRange) {
    pause(pick(range)).await;
}

/// Sleep for `millis` milliseconds; zero returns immediately.
pub async fn pause(millis: u64) {
    if millis > 0 {
        sleep(ms(millis)).await;
    }
}

/// Clear `element`, let it settle, then type `text` one character at a time.
pub async fn type_like_human<B: Browser + ?Sized>(
    browser: &B,
    element: &B::Element,
    text: &str,
    delays: &DelayConfig,
) -> Result<()> {
    browser.clear(element).await?;
    pause(delays.field_settle_ms).await;

    for ch in text.chars() {
        browser.send_keys(element, &ch.to_string()).await?;
        random_delay(delays.keystroke_ms).await;
    }
    Ok(())
}
