use draftcell_core::Equality;
use web_time::Duration;

/// How a save buffer writes upstream.
pub struct SaveOptions<T> {
    /// Flush unsaved edits when the buffer is torn down.
    pub flush_on_teardown: bool,
    /// Flush automatically this long after the last local write.
    pub debounce: Option<Duration>,
    pub equality: Equality<T>,
}

impl<T> Default for SaveOptions<T> {
    fn default() -> Self {
        Self {
            flush_on_teardown: true,
            debounce: None,
            equality: Equality::Structural,
        }
    }
}

impl<T> Clone for SaveOptions<T> {
    fn clone(&self) -> Self {
        Self {
            flush_on_teardown: self.flush_on_teardown,
            debounce: self.debounce,
            equality: self.equality.clone(),
        }
    }
}

impl<T> std::fmt::Debug for SaveOptions<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveOptions")
            .field("flush_on_teardown", &self.flush_on_teardown)
            .field("debounce", &self.debounce)
            .field("equality", &self.equality)
            .finish()
    }
}

impl<T> SaveOptions<T> {
    /// Flush only on request or teardown.
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn debounced(delay: Duration) -> Self {
        Self::default().with_debounce(delay)
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }

    pub fn with_flush_on_teardown(mut self, flush: bool) -> Self {
        self.flush_on_teardown = flush;
        self
    }

    pub fn with_equality(mut self, equality: Equality<T>) -> Self {
        self.equality = equality;
        self
    }

    /// A debounced buffer always flushes on teardown; its pending timer would
    /// otherwise lose the edit.
    pub(crate) fn flushes_on_teardown(&self) -> bool {
        self.flush_on_teardown || self.debounce.is_some()
    }
}

/// Serializable subset of [`SaveOptions`] for config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SaveConfig {
    pub flush_on_teardown: bool,
    pub debounce_ms: Option<u64>,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            flush_on_teardown: true,
            debounce_ms: None,
        }
    }
}

impl<T> From<SaveConfig> for SaveOptions<T> {
    fn from(cfg: SaveConfig) -> Self {
        Self {
            flush_on_teardown: cfg.flush_on_teardown,
            debounce: cfg.debounce_ms.map(Duration::from_millis),
            equality: Equality::Structural,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_implies_flush_on_teardown() {
        let opts = SaveOptions::<i32>::debounced(Duration::from_millis(10))
            .with_flush_on_teardown(false);
        assert!(opts.flushes_on_teardown());

        let manual = SaveOptions::<i32>::manual().with_flush_on_teardown(false);
        assert!(!manual.flushes_on_teardown());
    }

    #[test]
    fn config_converts_to_options() {
        let opts: SaveOptions<String> = SaveConfig {
            flush_on_teardown: false,
            debounce_ms: Some(300),
        }
        .into();
        assert_eq!(opts.debounce, Some(Duration::from_millis(300)));
        assert!(!opts.flush_on_teardown);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_fields_default_when_missing() {
        let cfg: SaveConfig = serde_json::from_str(r#"{"debounce_ms": 120}"#).unwrap();
        assert_eq!(
            cfg,
            SaveConfig {
                flush_on_teardown: true,
                debounce_ms: Some(120),
            }
        );
    }
}
