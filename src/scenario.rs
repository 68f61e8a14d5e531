//! TOML scenarios: registries, definitions and shadow-root containers,
//! followed by a list of DOM steps. Running a scenario yields a textual report
//! of every container's markup and the upgrade state and change log of each
//! element inside it.

use custom_elements::{
    ConstructorRef, CustomElementClass, DefineOptions, Document, DomError, EngineConfig, NodeId,
    RegistryError, RegistryId,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub config: ConfigSpec,
    #[serde(default)]
    pub registry: Vec<RegistrySpec>,
    #[serde(default)]
    pub define: Vec<DefineSpec>,
    #[serde(default)]
    pub container: Vec<ContainerSpec>,
    #[serde(default)]
    pub step: Vec<Step>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConfigSpec {
    pub upgrade_on_insertion: Option<bool>,
    pub upgrade_on_define: Option<bool>,
    pub max_depth: Option<usize>,
}

impl ConfigSpec {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(value) = self.upgrade_on_insertion {
            config.upgrade_on_insertion = value;
        }
        if let Some(value) = self.upgrade_on_define {
            config.upgrade_on_define = value;
        }
        if let Some(value) = self.max_depth {
            config.fragment.max_depth = value;
        }
        config
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySpec {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefineSpec {
    #[serde(default = "global_registry_name")]
    pub registry: String,
    pub tag: String,
    #[serde(default)]
    pub observed: Vec<String>,
}

/// A `<div>` appended to the body, or placed in a fresh shadow root when
/// `shadow` is set or a `registry` is named.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerSpec {
    pub name: String,
    #[serde(default)]
    pub shadow: bool,
    pub registry: Option<String>,
}

/// Element-targeting steps address the `index`-th element child of a container.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    SetInnerHtml {
        container: String,
        markup: String,
    },
    InsertAdjacentHtml {
        container: String,
        #[serde(default)]
        index: usize,
        position: String,
        markup: String,
    },
    SetAttribute {
        container: String,
        #[serde(default)]
        index: usize,
        name: String,
        value: String,
    },
    RemoveAttribute {
        container: String,
        #[serde(default)]
        index: usize,
        name: String,
    },
    ToggleAttribute {
        container: String,
        #[serde(default)]
        index: usize,
        name: String,
        force: Option<bool>,
    },
    SetAttributeNode {
        container: String,
        #[serde(default)]
        index: usize,
        name: String,
        value: String,
    },
    Define(DefineSpec),
}

fn global_registry_name() -> String {
    GLOBAL.to_string()
}

const GLOBAL: &str = "global";

#[derive(Debug)]
pub enum ScenarioError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    UnknownRegistry(String),
    UnknownContainer(String),
    MissingElement { container: String, index: usize },
    Registry(RegistryError),
    Dom(DomError),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ScenarioError::Parse(err) => write!(f, "invalid scenario: {err}"),
            ScenarioError::UnknownRegistry(name) => write!(f, "unknown registry '{name}'"),
            ScenarioError::UnknownContainer(name) => write!(f, "unknown container '{name}'"),
            ScenarioError::MissingElement { container, index } => {
                write!(f, "container '{container}' has no element child #{index}")
            }
            ScenarioError::Registry(err) => err.fmt(f),
            ScenarioError::Dom(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScenarioError::Io { source, .. } => Some(source),
            ScenarioError::Parse(err) => Some(err),
            ScenarioError::Registry(err) => Some(err),
            ScenarioError::Dom(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ScenarioError {
    fn from(err: toml::de::Error) -> Self {
        ScenarioError::Parse(err)
    }
}

impl From<RegistryError> for ScenarioError {
    fn from(err: RegistryError) -> Self {
        ScenarioError::Registry(err)
    }
}

impl From<DomError> for ScenarioError {
    fn from(err: DomError) -> Self {
        ScenarioError::Dom(err)
    }
}

/// Hook implementation bound to every scenario definition. Hooks only log;
/// the report reads the document's own change log.
struct ScenarioClass {
    tag: String,
}

impl CustomElementClass for ScenarioClass {
    fn constructed(&self, element: NodeId) {
        log::debug!(target: "scoped_elements.scenario", "<{}> constructed {element:?}", self.tag);
    }

    fn connected(&self, element: NodeId) {
        log::debug!(target: "scoped_elements.scenario", "<{}> connected {element:?}", self.tag);
    }

    fn disconnected(&self, element: NodeId) {
        log::debug!(target: "scoped_elements.scenario", "<{}> disconnected {element:?}", self.tag);
    }
}

pub fn parse(source: &str) -> Result<Scenario, ScenarioError> {
    Ok(toml::from_str(source)?)
}

pub fn run_file(path: &Path) -> Result<Vec<String>, ScenarioError> {
    let source = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    run(&parse(&source)?)
}

pub fn run(scenario: &Scenario) -> Result<Vec<String>, ScenarioError> {
    let mut runner = Runner::new(scenario.config.engine_config());
    for spec in &scenario.registry {
        let id = runner.doc.create_scoped_registry();
        runner.registries.insert(spec.name.clone(), id);
    }
    for spec in &scenario.define {
        runner.define(spec)?;
    }
    for spec in &scenario.container {
        runner.add_container(spec)?;
    }
    for step in &scenario.step {
        runner.apply(step)?;
    }
    Ok(runner.report())
}

struct Runner {
    doc: Document,
    registries: HashMap<String, RegistryId>,
    containers: Vec<(String, NodeId)>,
}

impl Runner {
    fn new(config: EngineConfig) -> Self {
        let mut registries = HashMap::new();
        registries.insert(GLOBAL.to_string(), RegistryId::GLOBAL);
        Self {
            doc: Document::with_config(config),
            registries,
            containers: Vec::new(),
        }
    }

    fn registry(&self, name: &str) -> Result<RegistryId, ScenarioError> {
        self.registries
            .get(name)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownRegistry(name.to_string()))
    }

    fn registry_name(&self, id: RegistryId) -> &str {
        self.registries
            .iter()
            .find(|(_, candidate)| **candidate == id)
            .map_or("?", |(name, _)| name.as_str())
    }

    fn define(&mut self, spec: &DefineSpec) -> Result<(), ScenarioError> {
        let registry = self.registry(&spec.registry)?;
        let class: ConstructorRef = Rc::new(ScenarioClass {
            tag: spec.tag.clone(),
        });
        self.doc.define(
            registry,
            &spec.tag,
            class,
            DefineOptions::observing(spec.observed.iter().cloned()),
        )?;
        Ok(())
    }

    fn add_container(&mut self, spec: &ContainerSpec) -> Result<(), ScenarioError> {
        let body = self.doc.body();
        let container = self.doc.create_element("div")?;
        let parent = if spec.shadow || spec.registry.is_some() {
            let registry = spec
                .registry
                .as_deref()
                .map(|name| self.registry(name))
                .transpose()?;
            let host = self.doc.create_element("div")?;
            self.doc.append_child(body, host)?;
            self.doc.attach_shadow(host, registry)?
        } else {
            body
        };
        self.doc.append_child(parent, container)?;
        self.containers.push((spec.name.clone(), container));
        Ok(())
    }

    fn container(&self, name: &str) -> Result<NodeId, ScenarioError> {
        self.containers
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, node)| *node)
            .ok_or_else(|| ScenarioError::UnknownContainer(name.to_string()))
    }

    fn element(&self, container: &str, index: usize) -> Result<NodeId, ScenarioError> {
        let node = self.container(container)?;
        self.doc
            .element_children(node)
            .get(index)
            .copied()
            .ok_or_else(|| ScenarioError::MissingElement {
                container: container.to_string(),
                index,
            })
    }

    fn apply(&mut self, step: &Step) -> Result<(), ScenarioError> {
        log::debug!(target: "scoped_elements.scenario", "step {step:?}");
        match step {
            Step::SetInnerHtml { container, markup } => {
                let node = self.container(container)?;
                self.doc.set_inner_html(node, markup)?;
            }
            Step::InsertAdjacentHtml {
                container,
                index,
                position,
                markup,
            } => {
                let el = self.element(container, *index)?;
                self.doc.insert_adjacent_html(el, position, markup)?;
            }
            Step::SetAttribute {
                container,
                index,
                name,
                value,
            } => {
                let el = self.element(container, *index)?;
                self.doc.set_attribute(el, name, value)?;
            }
            Step::RemoveAttribute {
                container,
                index,
                name,
            } => {
                let el = self.element(container, *index)?;
                self.doc.remove_attribute(el, name)?;
            }
            Step::ToggleAttribute {
                container,
                index,
                name,
                force,
            } => {
                let el = self.element(container, *index)?;
                self.doc.toggle_attribute(el, name, *force)?;
            }
            Step::SetAttributeNode {
                container,
                index,
                name,
                value,
            } => {
                let el = self.element(container, *index)?;
                let attr = self.doc.create_attribute(name)?;
                self.doc.set_attr_value(attr, value)?;
                self.doc.set_attribute_node(el, attr)?;
            }
            Step::Define(spec) => self.define(spec)?,
        }
        Ok(())
    }

    fn report(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (name, container) in &self.containers {
            let registry = self.doc.resolve_registry(*container);
            lines.push(format!(
                "[{name}] ({}) {}",
                self.registry_name(registry),
                self.doc.inner_html(*container)
            ));
            let mut stack: Vec<NodeId> =
                self.doc.children(*container).iter().rev().copied().collect();
            while let Some(node) = stack.pop() {
                stack.extend(self.doc.children(node).iter().rev().copied());
                let Some(local_name) = self.doc.local_name(node) else {
                    continue;
                };
                let state = if self.doc.is_upgraded(node) {
                    "upgraded"
                } else {
                    "plain"
                };
                lines.push(format!("  <{local_name}> {state}"));
                for change in self.doc.changed_attributes(node) {
                    lines.push(format!(
                        "    {}: {} -> {}",
                        change.name,
                        display_value(change.old_value.as_deref()),
                        display_value(change.new_value.as_deref())
                    ));
                }
            }
        }
        lines
    }
}

fn display_value(value: Option<&str>) -> String {
    value.map_or_else(|| "null".to_string(), |value| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCOPED: &str = r#"
[[registry]]
name = "r"

[[define]]
registry = "r"
tag = "x-foo"
observed = ["foo"]

[[container]]
name = "inside"
registry = "r"

[[container]]
name = "outside"

[[step]]
action = "set-inner-html"
container = "inside"
markup = '<x-foo foo="1"></x-foo>'

[[step]]
action = "set-inner-html"
container = "outside"
markup = '<x-foo foo="1"></x-foo>'

[[step]]
action = "set-attribute-node"
container = "inside"
name = "foo"
value = "2"
"#;

    #[test]
    fn parses_steps_by_action_tag() {
        let scenario = parse(SCOPED).unwrap();
        assert_eq!(scenario.registry.len(), 1);
        assert_eq!(scenario.define[0].observed, vec!["foo".to_string()]);
        assert!(matches!(
            &scenario.step[2],
            Step::SetAttributeNode { index: 0, name, value, .. } if name == "foo" && value == "2"
        ));
        assert!(scenario.container[0].registry.is_some());
    }

    #[test]
    fn report_shows_scoped_upgrade_only_inside_the_shadow_root() {
        let report = run(&parse(SCOPED).unwrap()).unwrap();
        assert_eq!(
            report,
            vec![
                r#"[inside] (r) <x-foo foo="2"></x-foo>"#.to_string(),
                "  <x-foo> upgraded".to_string(),
                r#"    foo: null -> "1""#.to_string(),
                r#"    foo: "1" -> "2""#.to_string(),
                r#"[outside] (global) <x-foo foo="1"></x-foo>"#.to_string(),
                "  <x-foo> plain".to_string(),
            ]
        );
    }

    #[test]
    fn define_step_upgrades_existing_elements() {
        let scenario = parse(
            r#"
[[container]]
name = "c"

[[step]]
action = "set-inner-html"
container = "c"
markup = "<x-late></x-late>"

[[step]]
action = "define"
tag = "x-late"
"#,
        )
        .unwrap();
        let report = run(&scenario).unwrap();
        assert_eq!(report[1], "  <x-late> upgraded");
    }

    #[test]
    fn config_overrides_engine_defaults() {
        let scenario = parse(
            r#"
[config]
upgrade-on-define = false
max-depth = 4
"#,
        )
        .unwrap();
        let config = scenario.config.engine_config();
        assert!(!config.upgrade_on_define);
        assert!(config.upgrade_on_insertion);
        assert_eq!(config.fragment.max_depth, 4);
    }

    #[test]
    fn reports_unknown_names() {
        let scenario = parse(
            r#"
[[define]]
registry = "missing"
tag = "x-foo"
"#,
        )
        .unwrap();
        assert!(matches!(
            run(&scenario),
            Err(ScenarioError::UnknownRegistry(name)) if name == "missing"
        ));

        let scenario = parse(
            r#"
[[step]]
action = "set-attribute"
container = "nowhere"
name = "foo"
value = "bar"
"#,
        )
        .unwrap();
        assert!(matches!(
            run(&scenario),
            Err(ScenarioError::UnknownContainer(_))
        ));
        assert!(matches!(parse("bogus = 1"), Err(ScenarioError::Parse(_))));
    }
}
