use html::FragmentConfig;

/// Engine behavior switches.
///
/// `upgrade_on_insertion` re-attempts upgrades whenever a subtree is moved
/// through `append_child`/`insert_before` from one scope into another, so an
/// element moved into a scope that defines its tag upgrades there. A subtree
/// taken from a detached fragment or element was deferred and is retried on
/// insertion regardless of this flag, as is every `innerHTML` and
/// `insertAdjacentHTML` pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub upgrade_on_insertion: bool,
    pub upgrade_on_define: bool,
    pub fragment: FragmentConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            upgrade_on_insertion: true,
            upgrade_on_define: true,
            fragment: FragmentConfig::default(),
        }
    }
}
