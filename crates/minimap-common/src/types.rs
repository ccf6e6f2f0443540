use serde::{Deserialize, Serialize};
use std::fmt;

/// Element geometry in host screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.w, self.h, self.x, self.y)
    }
}

/// Partial geometry pushed by the host. Absent fields keep their old value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundUpdate {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub w: Option<i64>,
    pub h: Option<i64>,
}

impl BoundUpdate {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.w.is_none() && self.h.is_none()
    }

    /// Apply on top of `base`.
    pub fn apply(&self, base: Bound) -> Bound {
        Bound {
            x: self.x.unwrap_or(base.x),
            y: self.y.unwrap_or(base.y),
            w: self.w.unwrap_or(base.w),
            h: self.h.unwrap_or(base.h),
        }
    }
}

/// Host UI mode mirrored by the client. Only used to gate auto-hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeFlags {
    pub lock: bool,
    #[serde(rename = "move")]
    pub moving: bool,
    pub dev: bool,
}

impl ModeFlags {
    /// True when the host UI is locked, not being moved and not in dev mode.
    pub fn is_locked_idle(&self) -> bool {
        self.lock && !self.moving && !self.dev
    }
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self {
            lock: true,
            moving: false,
            dev: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_update_applies_only_present_fields() {
        let base = Bound {
            x: 100,
            y: 100,
            w: 300,
            h: 300,
        };
        let update = BoundUpdate {
            x: Some(5),
            h: Some(42),
            ..Default::default()
        };
        let merged = update.apply(base);
        assert_eq!(
            merged,
            Bound {
                x: 5,
                y: 100,
                w: 300,
                h: 42
            }
        );
    }

    #[test]
    fn empty_bound_update_is_identity() {
        let base = Bound {
            x: 1,
            y: 2,
            w: 3,
            h: 4,
        };
        let update = BoundUpdate::default();
        assert!(update.is_empty());
        assert_eq!(update.apply(base), base);
    }

    #[test]
    fn bound_display() {
        let b = Bound {
            x: 10,
            y: 20,
            w: 300,
            h: 200,
        };
        assert_eq!(b.to_string(), "300x200+10+20");
    }

    #[test]
    fn mode_flags_default_is_locked() {
        let flags = ModeFlags::default();
        assert!(flags.lock);
        assert!(!flags.moving);
        assert!(!flags.dev);
        assert!(flags.is_locked_idle());
    }

    #[test]
    fn mode_flags_any_flip_breaks_locked_idle() {
        let base = ModeFlags::default();
        assert!(!ModeFlags { lock: false, ..base }.is_locked_idle());
        assert!(!ModeFlags { moving: true, ..base }.is_locked_idle());
        assert!(!ModeFlags { dev: true, ..base }.is_locked_idle());
    }

    #[test]
    fn mode_flags_serialize_move_key() {
        let json = serde_json::to_value(ModeFlags::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "lock": true, "move": false, "dev": false })
        );
    }
}
