/// GLSL interface checking for the software device.
///
/// Shader bodies are never executed. Compiling scans the global declarations
/// (inputs, outputs, uniforms and the entry point) and reports problems in the
/// style of a driver info log; linking checks that the two stages agree with
/// each other and with the fixed textured pipeline the device rasterizes.
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0, multispace1, u32 as decimal},
    combinator::{all_consuming, opt, recognize, value},
    multi::many0_count,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use orrery_core::backend::{Compiled, ShaderStage};
use orrery_core::shaders::{MODEL_UNIFORM, PROJECTION_UNIFORM, TEXTURE_UNIFORM, VIEW_UNIFORM};
use orrery_core::ShaderError;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlslType {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Sampler2D,
}

impl GlslType {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "float" => GlslType::Float,
            "int" => GlslType::Int,
            "vec2" => GlslType::Vec2,
            "vec3" => GlslType::Vec3,
            "vec4" => GlslType::Vec4,
            "mat4" => GlslType::Mat4,
            "sampler2D" => GlslType::Sampler2D,
            _ => return None,
        })
    }
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GlslType::Float => "float",
            GlslType::Int => "int",
            GlslType::Vec2 => "vec2",
            GlslType::Vec3 => "vec3",
            GlslType::Vec4 => "vec4",
            GlslType::Mat4 => "mat4",
            GlslType::Sampler2D => "sampler2D",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Qualifier {
    In,
    Out,
    Uniform,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub ty: GlslType,
    pub name: String,
    pub location: Option<u32>,
}

/// Global interface of one compiled stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    pub inputs: Vec<Declaration>,
    pub outputs: Vec<Declaration>,
    pub uniforms: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledShader {
    pub stage: ShaderStage,
    pub interface: ShaderInterface,
}

/// Uniform types of a linked program, both stages merged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedProgram {
    uniforms: HashMap<String, GlslType>,
}

impl LinkedProgram {
    pub fn uniform_type(&self, name: &str) -> Option<GlslType> {
        self.uniforms.get(name).copied()
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn layout_location(input: &str) -> IResult<&str, u32> {
    delimited(
        pair(tag("layout"), multispace0),
        delimited(
            pair(char('('), multispace0),
            preceded(tuple((tag("location"), multispace0, char('='), multispace0)), decimal),
            pair(multispace0, char(')')),
        ),
        multispace0,
    )(input)
}

fn qualifier(input: &str) -> IResult<&str, Qualifier> {
    alt((
        value(Qualifier::Uniform, tag("uniform")),
        value(Qualifier::Out, tag("out")),
        value(Qualifier::In, tag("in")),
    ))(input)
}

/// `[layout(location = N)] in|out|uniform <type> <name>`
fn declaration(input: &str) -> IResult<&str, (Option<u32>, Qualifier, &str, &str)> {
    tuple((
        opt(layout_location),
        terminated(qualifier, multispace1),
        terminated(identifier, multispace1),
        identifier,
    ))(input)
}

/// `void main ( )`
fn entry_point(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((
            tag("void"),
            multispace1,
            tag("main"),
            multispace0,
            char('('),
            multispace0,
            opt(tag("void")),
            multispace0,
            char(')'),
        )),
    )(input)
}

/// `#version N [profile]`
fn version_directive(input: &str) -> IResult<&str, u32> {
    preceded(pair(tag("#version"), multispace1), decimal)(input)
}

/// Blank out comments, keeping newlines so line numbers stay valid
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Top-level pieces of a stage: statements ending in `;` and the headers of
/// function bodies, each with its starting line
enum TopLevel {
    Statement(usize, String),
    FunctionHeader(usize, String),
}

struct Diagnostics {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Diagnostics {
    fn error(&mut self, line: usize, message: impl fmt::Display) {
        self.errors.push(format!("ERROR: 0:{}: {}", line, message));
    }

    fn warning(&mut self, line: usize, message: impl fmt::Display) {
        self.warnings.push(format!("WARNING: 0:{}: {}", line, message));
    }
}

fn split_top_level(source: &str, diagnostics: &mut Diagnostics) -> Vec<TopLevel> {
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    let mut start_line = 1;
    let mut line = 1;

    for text in source.lines() {
        if depth == 0 && text.trim_start().starts_with('#') {
            line += 1;
            continue;
        }
        for c in text.chars() {
            match c {
                '{' => {
                    if depth == 0 {
                        items.push(TopLevel::FunctionHeader(start_line, current.trim().to_string()));
                        current.clear();
                    }
                    depth += 1;
                }
                '}' => {
                    depth -= 1;
                    if depth < 0 {
                        diagnostics.error(line, "unexpected '}'");
                        depth = 0;
                    }
                    start_line = line;
                }
                ';' if depth == 0 => {
                    items.push(TopLevel::Statement(start_line, current.trim().to_string()));
                    current.clear();
                }
                _ if depth == 0 => {
                    if current.trim().is_empty() {
                        start_line = line;
                    }
                    current.push(c);
                }
                _ => {}
            }
        }
        if depth == 0 {
            current.push('\n');
        }
        line += 1;
    }

    if depth > 0 {
        diagnostics.error(line - 1, "unexpected end of file, missing '}'");
    } else if !current.trim().is_empty() {
        diagnostics.error(start_line, format!("syntax error, missing ';' after '{}'", current.trim()));
    }
    items
}

/// Scan one stage. Errors fail the compile; warnings come back in the log.
pub fn compile(stage: ShaderStage, source: &str) -> Result<Compiled<CompiledShader>, ShaderError> {
    let source = strip_comments(source);
    let mut diagnostics = Diagnostics {
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let version = source
        .lines()
        .find(|l| !l.trim().is_empty())
        .and_then(|l| version_directive(l.trim()).ok())
        .map(|(_, version)| version);
    match version {
        None => diagnostics.warning(1, "no #version directive, assuming 330 core"),
        Some(v) if v < 330 => diagnostics.warning(1, format!("#version {} does not support layout locations", v)),
        Some(_) => {}
    }

    let mut interface = ShaderInterface::default();
    let mut has_main = false;
    for item in split_top_level(&source, &mut diagnostics) {
        match item {
            TopLevel::FunctionHeader(line, header) => {
                if all_consuming(entry_point)(header.as_str()).is_ok() {
                    if has_main {
                        diagnostics.error(line, "redefinition of 'main'");
                    }
                    has_main = true;
                }
            }
            TopLevel::Statement(line, statement) => {
                scan_statement(line, &statement, &mut interface, &mut diagnostics);
            }
        }
    }

    if !has_main {
        diagnostics.error(1, "missing entry point 'void main()'");
    }
    if stage == ShaderStage::Fragment && interface.outputs.is_empty() {
        diagnostics.warning(1, "fragment shader writes no outputs");
    }

    if !diagnostics.errors.is_empty() {
        let mut log = diagnostics.errors;
        log.extend(diagnostics.warnings);
        return Err(ShaderError::Compile {
            stage,
            log: log.join("\n"),
        });
    }

    Ok(Compiled {
        shader: CompiledShader { stage, interface },
        log: (!diagnostics.warnings.is_empty()).then(|| diagnostics.warnings.join("\n")),
    })
}

fn scan_statement(line: usize, statement: &str, interface: &mut ShaderInterface, diagnostics: &mut Diagnostics) {
    let first_word = identifier(statement).map(|(_, word)| word).unwrap_or("");
    if !matches!(first_word, "in" | "out" | "uniform" | "layout") {
        return;
    }

    let (location, qualifier, ty, name) = match all_consuming(declaration)(statement) {
        Ok((_, parsed)) => parsed,
        Err(_) => {
            diagnostics.error(line, format!("syntax error in declaration '{}'", statement));
            return;
        }
    };

    let Some(ty) = GlslType::from_name(ty) else {
        diagnostics.error(line, format!("unknown type '{}'", ty));
        return;
    };
    if qualifier == Qualifier::Uniform && location.is_some() {
        diagnostics.warning(line, format!("layout location on uniform '{}' is ignored", name));
    }

    let list = match qualifier {
        Qualifier::In => &mut interface.inputs,
        Qualifier::Out => &mut interface.outputs,
        Qualifier::Uniform => &mut interface.uniforms,
    };
    if list.iter().any(|d| d.name == name) {
        diagnostics.error(line, format!("redeclaration of '{}'", name));
        return;
    }
    list.push(Declaration {
        ty,
        name: name.to_string(),
        location,
    });
}

/// Vertex attributes the device feeds, by location
const VERTEX_ATTRIBUTES: [(u32, GlslType); 2] = [(0, GlslType::Vec3), (1, GlslType::Vec2)];

/// Uniforms the rasterizer reads, with the stage that has to declare them
const PIPELINE_UNIFORMS: [(&str, GlslType, ShaderStage); 4] = [
    (MODEL_UNIFORM, GlslType::Mat4, ShaderStage::Vertex),
    (VIEW_UNIFORM, GlslType::Mat4, ShaderStage::Vertex),
    (PROJECTION_UNIFORM, GlslType::Mat4, ShaderStage::Vertex),
    (TEXTURE_UNIFORM, GlslType::Sampler2D, ShaderStage::Fragment),
];

pub fn link(vertex: &CompiledShader, fragment: &CompiledShader) -> Result<LinkedProgram, ShaderError> {
    let mut errors = Vec::new();
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        errors.push("program needs one vertex and one fragment shader".to_string());
    }

    for input in &fragment.interface.inputs {
        match vertex.interface.outputs.iter().find(|o| o.name == input.name) {
            None => errors.push(format!(
                "fragment input '{}' has no matching vertex output",
                input.name
            )),
            Some(output) if output.ty != input.ty => errors.push(format!(
                "type mismatch for '{}': vertex writes {}, fragment reads {}",
                input.name, output.ty, input.ty
            )),
            Some(_) => {}
        }
    }

    for input in &vertex.interface.inputs {
        match input.location {
            None => errors.push(format!("vertex input '{}' needs an explicit location", input.name)),
            Some(location) => match VERTEX_ATTRIBUTES.iter().find(|(l, _)| *l == location) {
                Some((_, ty)) if *ty == input.ty => {}
                Some((_, ty)) => errors.push(format!(
                    "vertex input '{}' at location {} must be {}",
                    input.name, location, ty
                )),
                None => errors.push(format!("no vertex attribute at location {}", location)),
            },
        }
    }

    let mut uniforms = HashMap::new();
    for declared in vertex.interface.uniforms.iter().chain(&fragment.interface.uniforms) {
        match uniforms.insert(declared.name.clone(), declared.ty) {
            Some(previous) if previous != declared.ty => errors.push(format!(
                "uniform '{}' declared as both {} and {}",
                declared.name, previous, declared.ty
            )),
            _ => {}
        }
    }

    for (name, ty, stage) in PIPELINE_UNIFORMS {
        let shader = if stage == ShaderStage::Vertex { vertex } else { fragment };
        if !shader.interface.uniforms.iter().any(|u| u.name == name && u.ty == ty) {
            errors.push(format!("{} stage must declare 'uniform {} {}'", stage, ty, name));
        }
    }

    if !errors.is_empty() {
        return Err(ShaderError::Link {
            log: errors
                .iter()
                .map(|e| format!("error: {}", e))
                .collect::<Vec<_>>()
                .join("\n"),
        });
    }

    Ok(LinkedProgram { uniforms })
}
