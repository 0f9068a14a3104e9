//! Workflow Parser
//!
//! Handles loading type, tool and workflow definitions from YAML files.
//! A workflow file is replayed through [`WorkflowBuilder`] in file order,
//! so any error points at the first declaration that is wrong.
//!
//! # Example YAML Format
//!
//! ```yaml
//! name: alignment
//! inputs:
//!   fastq: FastqGzPairedEnd
//!   reference:
//!     type: FastaWithIndexes
//!     doc: Reference genome with bwa and samtools indexes
//! steps:
//!   - id: bwamem
//!     tool: BwaMem
//!     version: "0.7.17"
//!     in:
//!       reads: fastq
//!       reference: { source: reference }
//!       markShorterSplits: true
//!   - id: samtoolsview
//!     tool: SamToolsView
//!     in:
//!       sam: bwamem/out
//! outputs:
//!   out_bam: samtoolsview/out
//! ```
//!
//! A string binding value is a port reference (`name`, `step/output`,
//! `inputs.name` or `steps.step/output`). Wrap a string in `{ value: ... }`
//! to bind it as a literal instead; booleans, numbers and lists are
//! always literals.

use std::fs;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;

use super::builder::WorkflowBuilder;
use super::model::WorkflowGraph;
use super::port::{Binding, PortRef};
use crate::error::Result;
use crate::tool::{ToolCatalog, ToolSpec};
use crate::types::{Literal, TypeDef, TypeRegistry};

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TypesFile {
    #[serde(default)]
    types: Vec<TypeDef>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ToolsFile {
    #[serde(default)]
    tools: Vec<ToolSpec>,
}

/// A workflow definition as written in YAML.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkflowFile {
    /// Workflow name
    pub name: String,

    /// Input name -> type (or `{ type, doc }`)
    #[serde(default)]
    pub inputs: IndexMap<String, InputDef>,

    /// Steps in declaration order
    #[serde(default)]
    pub steps: Vec<StepDef>,

    /// Output name -> source port
    #[serde(default)]
    pub outputs: IndexMap<String, String>,
}

/// Workflow input declaration: a bare type expression or a detailed form.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum InputDef {
    Type(String),
    Detailed(DetailedInput),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct DetailedInput {
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub doc: Option<String>,
}

/// Step declaration.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct StepDef {
    pub id: String,
    pub tool: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "in")]
    pub bindings: IndexMap<String, BindingDef>,
}

/// Value bound to a step input.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum BindingDef {
    /// `source: <port>` map form
    Source(SourceDef),
    /// `value: <literal>` map form
    Value(ValueDef),
    /// Bare string: a port reference
    Port(String),
    /// Any other scalar or list: a literal
    Literal(Literal),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SourceDef {
    pub source: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ValueDef {
    pub value: Literal,
}

impl BindingDef {
    fn to_binding(&self) -> Result<Binding> {
        Ok(match self {
            Self::Source(def) => Binding::Port(def.source.parse::<PortRef>()?),
            Self::Port(source) => Binding::Port(source.parse::<PortRef>()?),
            Self::Value(def) => Binding::Literal(def.value.clone()),
            Self::Literal(literal) => Binding::Literal(literal.clone()),
        })
    }
}

/// Parses a type registry from YAML (`types: [...]`).
pub fn load_types_from_str(yaml: &str) -> Result<TypeRegistry> {
    let file: TypesFile = serde_yaml::from_str(yaml)?;
    let registry = TypeRegistry::from_defs(file.types)?;
    debug!("Type registry holds {} types", registry.len());
    Ok(registry)
}

/// Loads a type registry from a YAML file.
pub fn load_types(path: &str) -> Result<TypeRegistry> {
    info!("Loading types from: {}", path);
    let yaml = fs::read_to_string(path)?;
    load_types_from_str(&yaml)
}

/// Parses a tool catalog from YAML (`tools: [...]`).
pub fn load_tools_from_str(yaml: &str) -> Result<ToolCatalog> {
    let file: ToolsFile = serde_yaml::from_str(yaml)?;
    let catalog = ToolCatalog::from_tools(file.tools)?;
    debug!("Tool catalog holds {} tools", catalog.len());
    Ok(catalog)
}

/// Loads a tool catalog from a YAML file.
pub fn load_tools(path: &str) -> Result<ToolCatalog> {
    info!("Loading tools from: {}", path);
    let yaml = fs::read_to_string(path)?;
    load_tools_from_str(&yaml)
}

/// Builds and freezes a workflow from its parsed definition.
pub fn build_workflow(
    def: &WorkflowFile,
    types: Arc<TypeRegistry>,
    tools: &ToolCatalog,
) -> Result<Arc<WorkflowGraph>> {
    let mut builder = WorkflowBuilder::new(&def.name, Arc::clone(&types));

    for (name, input) in &def.inputs {
        match input {
            InputDef::Type(expr) => {
                builder.declare_input(name, types.parse(expr)?)?;
            }
            InputDef::Detailed(detailed) => {
                let data_type = types.parse(&detailed.data_type)?;
                match &detailed.doc {
                    Some(doc) => builder.declare_input_with_doc(name, data_type, doc.as_str())?,
                    None => builder.declare_input(name, data_type)?,
                };
            }
        }
    }

    for step in &def.steps {
        let tool = tools.get(&step.tool, step.version.as_deref())?;
        let bindings = step
            .bindings
            .iter()
            .map(|(name, binding)| Ok((name.clone(), binding.to_binding()?)))
            .collect::<Result<Vec<_>>>()?;
        builder.add_step(&step.id, &tool, bindings)?;
    }

    for (name, source) in &def.outputs {
        builder.declare_output(name, &source.parse::<PortRef>()?)?;
    }

    builder.freeze()
}

/// Parses, builds and freezes a workflow from YAML.
pub fn load_workflow_from_str(
    yaml: &str,
    types: Arc<TypeRegistry>,
    tools: &ToolCatalog,
) -> Result<Arc<WorkflowGraph>> {
    let def: WorkflowFile = serde_yaml::from_str(yaml)?;
    info!(
        "Parsed workflow '{}': {} inputs, {} steps, {} outputs",
        def.name,
        def.inputs.len(),
        def.steps.len(),
        def.outputs.len()
    );
    build_workflow(&def, types, tools)
}

/// Loads a workflow from a YAML file.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use pipeweaver::workflow::{load_tools, load_types, load_workflow};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let types = Arc::new(load_types("types.yaml")?);
///     let tools = load_tools("tools.yaml")?;
///     let graph = load_workflow("workflow.yaml", types, &tools)?;
///     println!("Loaded {} steps", graph.len());
///     Ok(())
/// }
/// ```
pub fn load_workflow(
    path: &str,
    types: Arc<TypeRegistry>,
    tools: &ToolCatalog,
) -> Result<Arc<WorkflowGraph>> {
    info!("Loading workflow from: {}", path);
    let yaml = fs::read_to_string(path)?;
    load_workflow_from_str(&yaml, types, tools)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::error::GraphError;
    use crate::translate::translate;
    use crate::translate::document::StepInput;
    use crate::types::Primitive;

    const TYPES: &str = r#"
types:
  - name: Fastq
  - name: Bam
  - name: IndexedBam
    extends: Bam
    secondary_files: [".bai"]
  - name: Vcf
"#;

    const TOOLS: &str = r#"
tools:
  - id: Align
    version: "1.0"
    inputs:
      reads: { type: Fastq }
      fast: { type: Boolean, required: false }
    outputs:
      out: { type: Bam }
  - id: Sort
    version: "2.0"
    inputs:
      bam: { type: Bam }
      order: { type: String, default: coordinate }
    outputs:
      out: { type: IndexedBam }
"#;

    fn setup() -> (Arc<TypeRegistry>, ToolCatalog) {
        (
            Arc::new(load_types_from_str(TYPES).unwrap()),
            load_tools_from_str(TOOLS).unwrap(),
        )
    }

    fn demo_path(file: &str) -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("demos")
            .join("variantcaller")
            .join(file)
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_load_types() {
        let (types, _) = setup();
        assert_eq!(types.primitive_of("IndexedBam"), Some(Primitive::File));
        assert!(types.is_subtype("IndexedBam", "Bam"));
    }

    #[test]
    fn test_load_types_unknown_field() {
        let err = load_types_from_str("types:\n  - name: Bam\n    parent: File\n").unwrap_err();
        assert!(matches!(err, GraphError::Yaml(_)));
    }

    #[test]
    fn test_load_tools() {
        let (_, tools) = setup();
        assert_eq!(tools.len(), 2);
        let sort = tools.get("Sort", None).unwrap();
        assert_eq!(sort.inputs["order"].default, Some(Literal::from("coordinate")));
    }

    #[test]
    fn test_load_workflow() {
        let (types, tools) = setup();
        let yaml = r#"
name: small
inputs:
  fastq: Fastq
  note:
    type: String
    doc: free text
steps:
  - id: align
    tool: Align
    in:
      reads: fastq
      fast: true
  - id: sort
    tool: Sort
    version: "2.0"
    in:
      bam: { source: steps.align/out }
      order: { value: queryname }
outputs:
  sorted: sort/out
"#;
        let graph = load_workflow_from_str(yaml, types, &tools).unwrap();
        assert_eq!(graph.name(), "small");
        assert_eq!(graph.inputs()["note"].doc.as_deref(), Some("free text"));

        let align = graph.step("align").unwrap();
        assert_eq!(align.bindings["fast"], Binding::Literal(Literal::Boolean(true)));

        let sort = graph.step("sort").unwrap();
        assert_eq!(
            sort.bindings["bam"],
            Binding::Port(PortRef::step_output("align", "out"))
        );
        assert_eq!(
            sort.bindings["order"],
            Binding::Literal(Literal::from("queryname"))
        );
        assert_eq!(
            graph.outputs()["sorted"].source,
            PortRef::step_output("sort", "out")
        );
    }

    #[test]
    fn test_load_workflow_forward_reference() {
        let (types, tools) = setup();
        let yaml = r#"
name: backwards
inputs:
  fastq: Fastq
steps:
  - id: sort
    tool: Sort
    in:
      bam: align/out
  - id: align
    tool: Align
    in:
      reads: fastq
"#;
        let err = load_workflow_from_str(yaml, types, &tools).unwrap_err();
        assert!(matches!(err, GraphError::UnresolvedReference { ref site, .. } if site.contains("sort")));
    }

    #[test]
    fn test_load_workflow_type_mismatch() {
        let (types, tools) = setup();
        let yaml = r#"
name: mismatch
inputs:
  calls: Vcf
steps:
  - id: sort
    tool: Sort
    in:
      bam: calls
"#;
        let err = load_workflow_from_str(yaml, types, &tools).unwrap_err();
        assert!(matches!(
            err,
            GraphError::TypeMismatch { ref expected, ref actual, .. } if expected == "Bam" && actual == "Vcf"
        ));
    }

    #[test]
    fn test_load_workflow_unknown_tool_and_type() {
        let (types, tools) = setup();
        let yaml = "name: w\nsteps:\n  - id: x\n    tool: Nope\n";
        assert!(matches!(
            load_workflow_from_str(yaml, Arc::clone(&types), &tools),
            Err(GraphError::UnknownTool { .. })
        ));

        let yaml = "name: w\ninputs:\n  x: Cram\n";
        assert!(matches!(
            load_workflow_from_str(yaml, types, &tools),
            Err(GraphError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_load_workflow_rejects_unknown_input_fields() {
        let (types, tools) = setup();
        let yaml = "name: w\ninputs:\n  fastq:\n    type: Fastq\n    dco: typo\n";
        assert!(matches!(
            load_workflow_from_str(yaml, types, &tools),
            Err(GraphError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_tools_rejects_misspelt_port_field() {
        let yaml = r#"
tools:
  - id: Align
    version: "1.0"
    inputs:
      reads: { type: Fastq, requried: false }
"#;
        assert!(matches!(load_tools_from_str(yaml), Err(GraphError::Yaml(_))));
    }

    #[test]
    fn test_load_tools_rejects_ambiguous_identity() {
        let yaml = r#"
tools:
  - id: Align
    version: "1_0"
"#;
        assert!(matches!(
            load_tools_from_str(yaml),
            Err(GraphError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_load_workflow_file_not_found() {
        let (types, tools) = setup();
        let result = load_workflow("/nonexistent/path/workflow.yaml", types, &tools);
        assert!(matches!(result, Err(GraphError::Io(_))));
    }

    #[test]
    fn test_load_workflow_invalid_yaml() {
        use tempfile::tempdir;

        let (types, tools) = setup();
        let temp_dir = tempdir().unwrap();
        let workflow_path = temp_dir.path().join("bad.yaml");
        std::fs::write(&workflow_path, "this is not valid yaml: [[[").unwrap();

        let result = load_workflow(workflow_path.to_str().unwrap(), types, &tools);
        assert!(matches!(result, Err(GraphError::Yaml(_))));
    }

    #[test]
    fn test_variantcaller_demo() {
        let types = Arc::new(load_types(&demo_path("types.yaml")).unwrap());
        let tools = load_tools(&demo_path("tools.yaml")).unwrap();
        let graph = load_workflow(&demo_path("workflow.yaml"), types, &tools).unwrap();

        let ids: Vec<_> = graph.steps().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "bwamem",
                "samtoolsview",
                "markduplicates",
                "sortsam",
                "fix_tags",
                "baserecalibration",
                "applybqsr",
                "haplotypecaller",
            ]
        );

        let doc = translate(&graph).unwrap();
        assert_eq!(doc.id, "variantcaller");
        assert_eq!(doc.tools.len(), 8);

        let outputs: Vec<_> = doc.outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            outputs,
            vec!["out_recalibration_table", "out_bam", "out_assembledbam", "out_variants"]
        );

        let applybqsr = &doc.steps[6];
        assert_eq!(
            applybqsr.inputs["recalFile"],
            StepInput::Source("steps.baserecalibration/out_recalibration_report".to_string())
        );

        let sortsam = &doc.steps[3];
        assert_eq!(
            sortsam.inputs["sortOrder"],
            StepInput::Default {
                default: Literal::from("coordinate")
            }
        );

        let known_sites = doc.inputs.iter().find(|i| i.name == "known_sites").unwrap();
        assert_eq!(known_sites.cwl_type, "File[]");
        assert_eq!(known_sites.secondary_files, vec![".tbi"]);
    }
}
