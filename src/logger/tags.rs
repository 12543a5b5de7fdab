/// Log tags identify the subsystem a message comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Rpc,
    Cache,
    Reclaim,
    Builder,
    Vesting,
}

impl LogTag {
    /// Key used by `--debug-<key>` flags and `logging.debug_tags`
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Rpc => "rpc",
            LogTag::Cache => "cache",
            LogTag::Reclaim => "reclaim",
            LogTag::Builder => "builder",
            LogTag::Vesting => "vesting",
        }
        .to_string()
    }

    /// Uppercase label without colors, used for file output
    pub fn to_plain_string(&self) -> String {
        self.to_debug_key().to_uppercase()
    }
}
