use std::collections::HashMap;
use std::time::Instant;

/// Tokens added per second and bucket capacity for one message type.
#[derive(Debug, Clone, Copy)]
struct RateLimitConfig {
    rate: f64,
    burst: u32,
}

/// Per-message-type limits. Game actions are strict, room management is
/// moderate, read-only traffic is generous.
fn limit_for(msg_type: &str) -> RateLimitConfig {
    match msg_type {
        "answer" => RateLimitConfig { rate: 1.0, burst: 3 },
        "vote" => RateLimitConfig { rate: 1.0, burst: 3 },
        "challenge" => RateLimitConfig { rate: 0.5, burst: 2 },
        "rebuttal" => RateLimitConfig { rate: 0.5, burst: 2 },
        "withdraw_challenge" => RateLimitConfig { rate: 0.5, burst: 2 },

        "create_room" => RateLimitConfig { rate: 0.5, burst: 2 },
        "join" => RateLimitConfig { rate: 0.5, burst: 3 },
        "leave_room" => RateLimitConfig { rate: 1.0, burst: 3 },
        "start_game" => RateLimitConfig { rate: 0.5, burst: 2 },

        "get_rooms" => RateLimitConfig { rate: 2.0, burst: 5 },
        "get_genres" => RateLimitConfig { rate: 2.0, burst: 5 },
        "ping" => RateLimitConfig { rate: 2.0, burst: 5 },

        // Unknown message types get a strict default
        _ => RateLimitConfig { rate: 1.0, burst: 2 },
    }
}

/// Applies to all messages regardless of type.
const GLOBAL_LIMIT: RateLimitConfig = RateLimitConfig {
    rate: 10.0,
    burst: 20,
};

/// Consecutive denials before the connection is dropped.
const DISCONNECT_THRESHOLD: u32 = 50;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    max: f64,
    rate: f64,
    last_check: Instant,
}

impl TokenBucket {
    fn new(config: RateLimitConfig) -> Self {
        Self {
            tokens: config.burst as f64,
            max: config.burst as f64,
            rate: config.rate,
            last_check: Instant::now(),
        }
    }

    fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_check).as_secs_f64();
        self.last_check = now;

        self.tokens = (self.tokens + elapsed * self.rate).min(self.max);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Rate limits for a single WebSocket connection: one global bucket plus a
/// lazily created bucket per message type, with violation escalation.
#[derive(Debug)]
pub struct ConnectionRateLimiter {
    global: TokenBucket,
    buckets: HashMap<String, TokenBucket>,
    violations: u32,
}

impl ConnectionRateLimiter {
    pub fn new() -> Self {
        Self {
            global: TokenBucket::new(GLOBAL_LIMIT),
            buckets: HashMap::new(),
            violations: 0,
        }
    }

    /// Checks the given message type against the limits.
    /// Returns `(allowed, should_disconnect)`.
    pub fn allow(&mut self, msg_type: &str) -> (bool, bool) {
        if !self.global.allow() {
            self.violations += 1;
            return (false, self.violations >= DISCONNECT_THRESHOLD);
        }

        let bucket = self
            .buckets
            .entry(msg_type.to_string())
            .or_insert_with(|| TokenBucket::new(limit_for(msg_type)));

        if !bucket.allow() {
            self.violations += 1;
            return (false, self.violations >= DISCONNECT_THRESHOLD);
        }

        self.violations = self.violations.saturating_sub(1);
        (true, false)
    }
}

impl Default for ConnectionRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
