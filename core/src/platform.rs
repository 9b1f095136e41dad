//! Platform quirk detection.
//!
//! Two workarounds depend on the host platform:
//!
//! - **Deferred refresh** (WebKit on Safari/iOS): the surface has not settled
//!   when the key handler runs, so dead-key insertion and statistics refresh
//!   are rescheduled to run after the handler returns.
//! - **Composition suppression** (macOS): the native composition session is
//!   blocked by making the surface non-editable during the key handler and
//!   restoring it afterwards.
//!
//! Detection is kept here so the engine only ever sees the two flags, and
//! tests can inject whatever combination they need.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static MAC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Mac|iPod|iPhone|iPad").expect("mac pattern"));

static IOS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"iP(ad|hone|od)").expect("ios pattern"));

/// Injectable quirk flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformQuirks {
    pub needs_deferred_refresh: bool,
    pub needs_composition_suppression: bool,
}

impl PlatformQuirks {
    /// No workarounds.
    pub fn none() -> Self {
        Self::default()
    }

    /// Detect quirks from the host's identification strings.
    ///
    /// `max_touch_points` distinguishes iPadOS, which reports itself as
    /// `MacIntel`, from a desktop Mac.
    pub fn detect(user_agent: &str, platform: &str, max_touch_points: u32) -> Self {
        let is_mac = MAC_RE.is_match(platform);
        let is_ios = IOS_RE.is_match(user_agent)
            || (platform == "MacIntel" && max_touch_points > 1);
        Self {
            needs_deferred_refresh: is_safari(user_agent) || is_ios,
            needs_composition_suppression: is_mac,
        }
    }
}

/// Safari proper: the UA mentions Safari but is not Chrome or Android, both
/// of which also carry the Safari token.
fn is_safari(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    match ua.find("safari") {
        Some(pos) => {
            let before = &ua[..pos];
            !before.contains("chrome") && !before.contains("android")
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";
    const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const ANDROID: &str = "Mozilla/5.0 (Linux; Android 14) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

    #[test]
    fn safari_on_mac_needs_both() {
        let q = PlatformQuirks::detect(SAFARI_MAC, "MacIntel", 0);
        assert!(q.needs_deferred_refresh);
        assert!(q.needs_composition_suppression);
    }

    #[test]
    fn chrome_on_mac_only_suppresses_composition() {
        let q = PlatformQuirks::detect(CHROME_MAC, "MacIntel", 0);
        assert!(!q.needs_deferred_refresh);
        assert!(q.needs_composition_suppression);
    }

    #[test]
    fn ipad_reporting_mac_intel_defers() {
        let q = PlatformQuirks::detect(CHROME_MAC, "MacIntel", 5);
        assert!(q.needs_deferred_refresh);
    }

    #[test]
    fn iphone_defers() {
        let q = PlatformQuirks::detect(IPHONE, "iPhone", 5);
        assert!(q.needs_deferred_refresh);
        assert!(q.needs_composition_suppression);
    }

    #[test]
    fn others_need_nothing() {
        assert_eq!(PlatformQuirks::detect(ANDROID, "Linux armv8l", 5), PlatformQuirks::none());
        assert_eq!(PlatformQuirks::detect(FIREFOX_LINUX, "Linux x86_64", 0), PlatformQuirks::none());
    }
}
