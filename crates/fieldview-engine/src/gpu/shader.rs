//! WGSL compile and link checks shared by every backend.
//!
//! "Compile" parses and validates one stage's source with naga. "Link"
//! checks that the compiled modules expose the stage entry points.

use std::fmt;

/// Vertex stage entry point every program must define.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment stage entry point every program must define.
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => VERTEX_ENTRY,
            ShaderStage::Fragment => FRAGMENT_ENTRY,
        }
    }

    fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{message}")]
    Compile { stage: ShaderStage, message: String },
    #[error("program failed to link: {0}")]
    Link(String),
}

/// A stage source that parsed and validated.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub module: naga::Module,
}

/// Parses and validates `source` as the given stage.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledStage, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        stage,
        message: e.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator.validate(&module).map_err(|e| ShaderError::Compile {
        stage,
        message: e.emit_to_string(source),
    })?;

    Ok(CompiledStage { stage, module })
}

/// Checks that each stage exposes its entry point.
pub fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<(), ShaderError> {
    for compiled in [vertex, fragment] {
        let entry = compiled.stage.entry_point();
        let found = compiled
            .module
            .entry_points
            .iter()
            .any(|ep| ep.name == entry && ep.stage == compiled.stage.naga());
        if !found {
            return Err(ShaderError::Link(format!(
                "{} stage has no `{entry}` entry point",
                compiled.stage
            )));
        }
    }
    Ok(())
}

/// Compiles both stages and links them.
pub fn build_program(vertex_source: &str, fragment_source: &str) -> Result<(), ShaderError> {
    let vertex = compile(ShaderStage::Vertex, vertex_source)?;
    let fragment = compile(ShaderStage::Fragment, fragment_source)?;
    link(&vertex, &fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "@vertex\nfn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {\n    return vec4<f32>(p, 1.0);\n}\n";
    const FS: &str = "@fragment\nfn fs_main() -> @location(0) vec4<f32> {\n    return vec4<f32>(1.0);\n}\n";

    #[test]
    fn valid_program_builds() {
        build_program(VS, FS).unwrap();
    }

    #[test]
    fn syntax_error_reports_stage() {
        let err = build_program(VS, "fn fs_main( {").unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Fragment, .. }));
    }

    #[test]
    fn undefined_function_fails_compile() {
        let fs = "@fragment\nfn fs_main() -> @location(0) vec4<f32> {\n    return vec4<f32>(colormap(vec3<f32>(0.0)), 1.0);\n}\n";
        let err = build_program(VS, fs).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Fragment, .. }));
    }

    #[test]
    fn missing_entry_point_fails_link() {
        let fs = FS.replace("fs_main", "main");
        let err = build_program(VS, &fs).unwrap_err();
        assert!(matches!(err, ShaderError::Link(_)));
    }

    #[test]
    fn entry_point_in_wrong_stage_fails_link() {
        // fragment source that only defines a vertex entry named fs_main
        let fs = VS.replace("vs_main", "fs_main");
        assert!(matches!(build_program(VS, &fs), Err(ShaderError::Link(_))));
    }
}
