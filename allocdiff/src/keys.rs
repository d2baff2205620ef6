/// Storage-key construction for the persisted snapshot log.
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str) -> Self {
        Self { prefix }
    }

    /// The single key under which the whole snapshot log is stored.
    pub fn snapshot_log(&self) -> String {
        format!("{}:snapshots", self.prefix)
    }
}
