//! Client identities tried in priority order when the source rejects a request.

/// One client identity: a player client name for the extractor plus the user
/// agent presented alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIdentity {
    pub name: &'static str,
    pub user_agent: &'static str,
}

impl ClientIdentity {
    /// Value for the tool's `--extractor-args`.
    pub fn extractor_args(&self) -> String {
        format!("youtube:player_client={}", self.name)
    }
}

/// Fixed fallback order. The first identity that yields a file wins.
pub const DEFAULT_IDENTITIES: &[ClientIdentity] = &[
    ClientIdentity {
        name: "android",
        user_agent: "com.google.android.youtube/19.09.37 (Linux; U; Android 11) gzip",
    },
    ClientIdentity {
        name: "ios",
        user_agent: "com.google.ios.youtube/19.09.3 (iPhone14,3; U; CPU iOS 15_6 like Mac OS X)",
    },
    ClientIdentity {
        name: "web",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    },
    ClientIdentity {
        name: "tv_embedded",
        user_agent: "Mozilla/5.0 (PlayStation; PlayStation 4/12.00) AppleWebKit/605.1.15 (KHTML, like Gecko)",
    },
];
