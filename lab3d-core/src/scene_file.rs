/// Line-based scene description format
///
/// ```text
/// # comment
/// speeds rotation 4 movement 10 scale 2
/// projection fov 90 near 0.1 far 10000 aspect 1.333
/// ambient 0.3 0.3 0.5
/// specular 256
/// camera position 0 5 -8 rotation 17 0 0
/// mesh box cube 2
/// mesh ground grid 40 8
/// model crate mesh box position 0 3 0 colour 1 0.3 0.2 shading cell 4 controlled
/// light key colour 0.8 0.8 1 strength 10 orbit crate radius 20 height 0 speed 0.7
/// ```
///
/// Angles are in degrees. Names must be declared before they are referenced.
use std::collections::HashMap;
use std::path::Path;

use nalgebra::Vector3;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{not_line_ending, space0, space1},
    combinator::{all_consuming, eof, map, opt, peek, recognize},
    multi::separated_list0,
    number::complete::float,
    sequence::{pair, preceded, terminated},
    IResult,
};

use crate::camera::Camera;
use crate::error::{Result, SceneError};
use crate::geometry::{Mesh, MeshId, MAX_GRID_DIVISIONS};
use crate::light::{Light, LightOrbit};
use crate::projection::Projection;
use crate::scene::{Material, Model, Scene, Shading};
use crate::transform::TransformState;

/// A single word or number on a statement line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    Word(&'a str),
    Number(f32),
}

/// One non-empty line: the leading keyword and the tokens after it
#[derive(Debug, Clone, PartialEq)]
pub struct Statement<'a> {
    pub line: usize,
    pub keyword: &'a str,
    pub tokens: Vec<Token<'a>>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    ))(input)
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    // Words go first so `inf` and `nan` stay names rather than numbers
    terminated(
        alt((map(identifier, Token::Word), map(float, Token::Number))),
        peek(alt((space1, eof, tag("#")))),
    )(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("#"), not_line_ending))(input)
}

fn parse_line_tokens(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    all_consuming(terminated(
        preceded(space0, separated_list0(space1, token)),
        pair(space0, opt(comment)),
    ))(input)
}

/// Split a scene description into statements, skipping blank and comment lines
pub fn parse_statements(input: &str) -> Result<Vec<Statement<'_>>> {
    let mut statements = Vec::new();
    for (index, text) in input.lines().enumerate() {
        let line = index + 1;
        let tokens = match parse_line_tokens(text) {
            Ok((_, tokens)) => tokens,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let near = e.input.split_whitespace().next().unwrap_or(e.input);
                return Err(SceneError::Syntax {
                    line,
                    near: near.to_string(),
                });
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(SceneError::Syntax {
                    line,
                    near: text.trim().to_string(),
                })
            }
        };

        let mut tokens = tokens.into_iter();
        match tokens.next() {
            None => continue,
            Some(Token::Word(keyword)) => statements.push(Statement {
                line,
                keyword,
                tokens: tokens.collect(),
            }),
            Some(Token::Number(_)) => {
                return Err(SceneError::Syntax {
                    line,
                    near: text.split_whitespace().next().unwrap_or_default().to_string(),
                })
            }
        }
    }
    Ok(statements)
}

/// Cursor over one statement's tokens with error reporting
struct Cursor<'s, 'a> {
    statement: &'s Statement<'a>,
    pos: usize,
}

impl<'s, 'a> Cursor<'s, 'a> {
    fn new(statement: &'s Statement<'a>) -> Self {
        Self { statement, pos: 0 }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.statement.tokens.get(self.pos).copied()
    }

    fn bad_value(&self, attribute: &str, expected: &'static str) -> SceneError {
        SceneError::BadValue {
            line: self.statement.line,
            attribute: attribute.to_string(),
            expected,
        }
    }

    fn unknown(&self, attribute: &str) -> SceneError {
        SceneError::UnknownAttribute {
            line: self.statement.line,
            keyword: self.statement.keyword.to_string(),
            attribute: attribute.to_string(),
        }
    }

    fn missing(&self, missing: &'static str) -> SceneError {
        SceneError::Missing {
            line: self.statement.line,
            keyword: self.statement.keyword.to_string(),
            missing,
        }
    }

    /// Next attribute name, or None at the end of the line
    fn attribute(&mut self) -> Result<Option<&'a str>> {
        match self.peek() {
            None => Ok(None),
            Some(Token::Word(word)) => {
                self.pos += 1;
                Ok(Some(word))
            }
            Some(Token::Number(n)) => Err(SceneError::Syntax {
                line: self.statement.line,
                near: n.to_string(),
            }),
        }
    }

    fn name(&mut self) -> Result<&'a str> {
        match self.peek() {
            Some(Token::Word(word)) => {
                self.pos += 1;
                Ok(word)
            }
            _ => Err(self.missing("a name")),
        }
    }

    fn word(&mut self, attribute: &str) -> Result<&'a str> {
        match self.peek() {
            Some(Token::Word(word)) => {
                self.pos += 1;
                Ok(word)
            }
            _ => Err(self.bad_value(attribute, "a name")),
        }
    }

    fn number(&mut self, attribute: &str) -> Result<f32> {
        match self.peek() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(n)
            }
            _ => Err(self.bad_value(attribute, "a number")),
        }
    }

    fn optional_number(&mut self) -> Option<f32> {
        match self.peek() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Some(n)
            }
            _ => None,
        }
    }

    fn vector(&mut self, attribute: &str) -> Result<Vector3<f32>> {
        let mut v = Vector3::zeros();
        for i in 0..3 {
            v[i] = self
                .number(attribute)
                .map_err(|_| self.bad_value(attribute, "three numbers"))?;
        }
        Ok(v)
    }

    fn angles(&mut self, attribute: &str) -> Result<Vector3<f32>> {
        Ok(self.vector(attribute)?.map(f32::to_radians))
    }

    /// One number for uniform scale, or three
    fn scale(&mut self, attribute: &str) -> Result<Vector3<f32>> {
        let x = self.number(attribute)?;
        match self.optional_number() {
            None => Ok(Vector3::repeat(x)),
            Some(y) => {
                let z = self
                    .number(attribute)
                    .map_err(|_| self.bad_value(attribute, "one or three numbers"))?;
                Ok(Vector3::new(x, y, z))
            }
        }
    }

    /// Finish a statement that takes bare values (no attribute names)
    fn finish(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(Token::Word(word)) => Err(self.unknown(word)),
            Some(Token::Number(n)) => Err(SceneError::Syntax {
                line: self.statement.line,
                near: n.to_string(),
            }),
        }
    }
}

/// Builds a scene statement by statement
struct SceneBuilder {
    scene: Scene,
    projection: Projection,
    meshes: HashMap<String, MeshId>,
    lights: HashMap<String, usize>,
    controlled: Option<usize>,
}

impl SceneBuilder {
    fn new() -> Self {
        Self {
            scene: Scene::new(Camera::default()),
            projection: Projection::default(),
            meshes: HashMap::new(),
            lights: HashMap::new(),
            controlled: None,
        }
    }

    fn apply(&mut self, statement: &Statement<'_>) -> Result<()> {
        let mut cursor = Cursor::new(statement);
        match statement.keyword {
            "speeds" => self.speeds(&mut cursor),
            "projection" => self.projection(&mut cursor),
            "ambient" => {
                self.scene.ambient = cursor.vector("ambient")?;
                cursor.finish()
            }
            "specular" => {
                self.scene.specular_power = cursor.number("specular")?;
                cursor.finish()
            }
            "camera" => self.camera(&mut cursor),
            "mesh" => self.mesh(&mut cursor),
            "model" => self.model(&mut cursor),
            "light" => self.light(&mut cursor),
            keyword => Err(SceneError::UnknownStatement {
                line: statement.line,
                keyword: keyword.to_string(),
            }),
        }
    }

    fn speeds(&mut self, cursor: &mut Cursor<'_, '_>) -> Result<()> {
        while let Some(attribute) = cursor.attribute()? {
            match attribute {
                "rotation" => self.scene.speeds.rotation = cursor.number(attribute)?,
                "movement" => self.scene.speeds.movement = cursor.number(attribute)?,
                "scale" => self.scene.speeds.scale = cursor.number(attribute)?,
                other => return Err(cursor.unknown(other)),
            }
        }
        Ok(())
    }

    fn projection(&mut self, cursor: &mut Cursor<'_, '_>) -> Result<()> {
        while let Some(attribute) = cursor.attribute()? {
            match attribute {
                "fov" => self.projection.fov_x = cursor.number(attribute)?.to_radians(),
                "near" => self.projection.near = cursor.number(attribute)?,
                "far" => self.projection.far = cursor.number(attribute)?,
                "aspect" => self.projection.aspect = cursor.number(attribute)?,
                other => return Err(cursor.unknown(other)),
            }
        }
        Ok(())
    }

    fn camera(&mut self, cursor: &mut Cursor<'_, '_>) -> Result<()> {
        let mut target = None;
        let mut transform = self.scene.camera.transform;
        while let Some(attribute) = cursor.attribute()? {
            match attribute {
                "position" => transform.position = cursor.vector(attribute)?,
                "rotation" => transform.rotation = cursor.angles(attribute)?,
                "target" => target = Some(cursor.vector(attribute)?),
                other => return Err(cursor.unknown(other)),
            }
        }
        self.scene.camera = Camera::new(transform.position, transform.rotation, self.projection);
        if let Some(target) = target {
            self.scene.camera.face_target(&target);
        }
        Ok(())
    }

    fn mesh(&mut self, cursor: &mut Cursor<'_, '_>) -> Result<()> {
        let line = cursor.statement.line;
        let name = cursor.name()?;
        if self.meshes.contains_key(name) {
            return Err(SceneError::Duplicate {
                line,
                kind: "mesh",
                name: name.to_string(),
            });
        }

        let kind = cursor
            .attribute()?
            .ok_or_else(|| cursor.missing("a shape (cube, grid or marker)"))?;
        let mesh = match kind {
            "cube" => Mesh::cube(cursor.optional_number().unwrap_or(1.0)),
            "marker" => Mesh::marker(cursor.optional_number().unwrap_or(1.0)),
            "grid" => {
                let size = cursor.number(kind)?;
                let divisions = cursor.optional_number().unwrap_or(1.0);
                if !(1.0..=MAX_GRID_DIVISIONS as f32).contains(&divisions)
                    || divisions.fract() != 0.0
                {
                    return Err(cursor.bad_value(kind, "a whole number of divisions from 1 to 1024"));
                }
                Mesh::grid(size, divisions as u32)
            }
            other => return Err(cursor.unknown(other)),
        };
        cursor.finish()?;

        log::debug!("mesh `{name}`: {kind} with {} triangles", mesh.triangles.len());
        let id = self.scene.add_mesh(mesh);
        self.meshes.insert(name.to_string(), id);
        Ok(())
    }

    fn model(&mut self, cursor: &mut Cursor<'_, '_>) -> Result<()> {
        let line = cursor.statement.line;
        let name = cursor.name()?;
        if self.scene.model_index(name).is_some() {
            return Err(SceneError::Duplicate {
                line,
                kind: "model",
                name: name.to_string(),
            });
        }

        let mut mesh = None;
        let mut transform = TransformState::identity();
        let mut material = Material::default();
        let mut target = None;
        let mut controlled = false;

        while let Some(attribute) = cursor.attribute()? {
            match attribute {
                "mesh" => {
                    let mesh_name = cursor.word(attribute)?;
                    let id = self.meshes.get(mesh_name).copied().ok_or_else(|| {
                        SceneError::UnknownMesh {
                            line,
                            name: mesh_name.to_string(),
                        }
                    })?;
                    mesh = Some(id);
                }
                "position" => transform.position = cursor.vector(attribute)?,
                "rotation" => transform.rotation = cursor.angles(attribute)?,
                "scale" => transform.scale = cursor.scale(attribute)?,
                "target" => target = Some(cursor.vector(attribute)?),
                "colour" | "color" => material.colour = cursor.vector(attribute)?,
                "shading" => material.shading = shading(cursor)?,
                "controlled" => controlled = true,
                other => return Err(cursor.unknown(other)),
            }
        }

        let mesh = mesh.ok_or_else(|| cursor.missing("a mesh"))?;
        let mut model = Model::new(name, mesh, transform).with_material(material);
        if let Some(target) = target {
            model.transform.face_target(&target);
            model.refresh();
        }
        let index = self.scene.add_model(model)?;

        if controlled {
            if let Some(previous) = self.controlled.replace(index) {
                log::warn!(
                    "line {line}: `{name}` takes control from `{}`",
                    self.scene.models[previous].name
                );
            }
        }
        Ok(())
    }

    fn light(&mut self, cursor: &mut Cursor<'_, '_>) -> Result<()> {
        let line = cursor.statement.line;
        let name = cursor.name()?;
        if self.lights.contains_key(name) {
            return Err(SceneError::Duplicate {
                line,
                kind: "light",
                name: name.to_string(),
            });
        }

        let mut light = Light::new(name, Vector3::repeat(1.0), 1.0);
        let mut orbit_target = None;
        let mut orbit = LightOrbit::default();

        while let Some(attribute) = cursor.attribute()? {
            match attribute {
                "colour" | "color" => light.colour = cursor.vector(attribute)?,
                "strength" => light.strength = cursor.number(attribute)?,
                "position" => light.position = cursor.vector(attribute)?,
                "orbit" => {
                    let model_name = cursor.word(attribute)?;
                    let index = self.scene.model_index(model_name).ok_or_else(|| {
                        SceneError::UnknownModel {
                            line,
                            name: model_name.to_string(),
                        }
                    })?;
                    orbit_target = Some(index);
                }
                "radius" => orbit.radius = cursor.number(attribute)?,
                "height" => orbit.height = cursor.number(attribute)?,
                "speed" => orbit.speed = cursor.number(attribute)?,
                "angle" => orbit.angle = cursor.number(attribute)?.to_radians(),
                other => return Err(cursor.unknown(other)),
            }
        }

        if let Some(target) = orbit_target {
            light = light.orbiting(target, orbit);
        } else if orbit != LightOrbit::default() {
            return Err(cursor.missing("an `orbit` target for its orbit settings"));
        }

        let index = self.scene.add_light(light)?;
        self.lights.insert(name.to_string(), index);
        Ok(())
    }

    fn finish(mut self) -> Result<Scene> {
        self.projection.validate()?;
        self.scene.camera.projection = self.projection;
        if self.controlled.is_some() {
            self.scene.set_controlled(self.controlled)?;
        }
        Ok(self.scene)
    }
}

fn shading(cursor: &mut Cursor<'_, '_>) -> Result<Shading> {
    match cursor.word("shading")? {
        "lit" => Ok(Shading::Lit),
        "unlit" => Ok(Shading::Unlit),
        "cell" => {
            let bands = cursor.optional_number().unwrap_or(4.0);
            if !(2.0..=255.0).contains(&bands) || bands.fract() != 0.0 {
                return Err(cursor.bad_value("shading cell", "a band count from 2 to 255"));
            }
            Ok(Shading::Cell(bands as u8))
        }
        _ => Err(cursor.bad_value("shading", "lit, unlit or cell")),
    }
}

/// Build a scene from description text
pub fn parse_scene(input: &str) -> Result<Scene> {
    let mut builder = SceneBuilder::new();
    for statement in parse_statements(input)? {
        builder.apply(&statement)?;
    }
    let scene = builder.finish()?;
    log::debug!(
        "scene ready: {} models, {} lights",
        scene.models.len(),
        scene.lights.len()
    );
    Ok(scene)
}

/// Read and build a scene file
pub fn load_scene(path: impl AsRef<Path>) -> Result<Scene> {
    let path = path.as_ref();
    log::info!("loading scene from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    parse_scene(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math;

    const SAMPLE: &str = "\
# Parallax lab layout
speeds rotation 2 movement 50
projection fov 60 near 1 far 1000
ambient 0.3 0.3 0.5
specular 64

camera position 40 30 -90 rotation 8 -18 0
mesh box cube 2
mesh hills grid 100 10   # floor
model floor mesh hills
model cube mesh box position 10 15 -40 colour 1 0.5 0.2 shading cell 3 controlled
model teapot mesh box position 40 10 10 scale 1 2 1
light light1 colour 0.8 0.8 1 strength 10 orbit cube radius 20 speed 0.7
light light2 colour 1 0.8 0.2 strength 40 position 20 40 -20
";

    #[test]
    fn test_tokenizer() {
        let statements = parse_statements("model a  mesh b # trailing\n\n   # only comment\nambient -1 2.5e1 .5").unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].keyword, "model");
        assert_eq!(
            statements[0].tokens,
            [Token::Word("a"), Token::Word("mesh"), Token::Word("b")]
        );
        assert_eq!(statements[1].line, 4);
        assert_eq!(
            statements[1].tokens,
            [Token::Number(-1.0), Token::Number(25.0), Token::Number(0.5)]
        );
    }

    #[test]
    fn test_sample_scene() {
        let scene = parse_scene(SAMPLE).unwrap();

        assert_eq!(scene.models.len(), 3);
        assert_eq!(scene.lights.len(), 2);
        assert_eq!(scene.speeds.rotation, 2.0);
        assert_eq!(scene.speeds.movement, 50.0);
        assert_eq!(scene.speeds.scale, crate::control::SCALE_SPEED);
        assert_eq!(scene.specular_power, 64.0);
        assert!((scene.camera.projection.fov_x - 60f32.to_radians()).abs() < 1e-6);
        assert!((scene.camera.transform.rotation.y - (-18f32).to_radians()).abs() < 1e-6);

        let cube = &scene.models[1];
        assert_eq!(scene.controlled().map(|m| m.name.as_str()), Some("cube"));
        assert_eq!(cube.material.shading, Shading::Cell(3));
        assert_eq!(cube.position(), Vector3::new(10.0, 15.0, -40.0));
        assert_eq!(scene.models[2].transform.scale, Vector3::new(1.0, 2.0, 1.0));

        let (target, orbit) = scene.lights[0].orbit.unwrap();
        assert_eq!(target, 1);
        assert_eq!(orbit.radius, 20.0);
        assert_eq!(scene.lights[1].position, Vector3::new(20.0, 40.0, -20.0));
    }

    #[test]
    fn test_shipped_scene() {
        let scene = parse_scene(include_str!("../../scenes/parallax_lab.scene")).unwrap();
        assert_eq!(scene.controlled().map(|m| m.name.as_str()), Some("cube"));
        assert_eq!(scene.models[2].transform.scale, Vector3::repeat(0.5));
        assert!(!scene.orbits_paused());
    }

    #[test]
    fn test_first_model_controlled_by_default() {
        let scene = parse_scene("mesh m cube\nmodel a mesh m\nmodel b mesh m").unwrap();
        assert_eq!(scene.controlled().map(|m| m.name.as_str()), Some("a"));
    }

    #[test]
    fn test_model_target() {
        let scene =
            parse_scene("mesh m marker\nmodel spot mesh m position 0 10 0 target 0 0 0").unwrap();
        let forward = math::z_axis(&scene.models[0].world_matrix());
        assert!((forward - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-5);
    }

    fn error_of(input: &str) -> SceneError {
        match parse_scene(input) {
            Ok(_) => panic!("expected an error for {input:?}"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        assert!(matches!(
            error_of("mesh m cube\n\nteapot"),
            SceneError::UnknownStatement { line: 3, .. }
        ));
        assert!(matches!(
            error_of("model a mesh nowhere"),
            SceneError::UnknownMesh { line: 1, .. }
        ));
        assert!(matches!(
            error_of("mesh m cube\nmesh m grid 4"),
            SceneError::Duplicate { line: 2, kind: "mesh", .. }
        ));
        assert!(matches!(
            error_of("mesh m cube\nmodel a mesh m position 1 2"),
            SceneError::BadValue { line: 2, .. }
        ));
        assert!(matches!(
            error_of("light l orbit ghost"),
            SceneError::UnknownModel { line: 1, .. }
        ));
        assert!(matches!(
            error_of("ambient 1 2 3 4"),
            SceneError::Syntax { line: 1, .. }
        ));
        assert!(matches!(
            error_of("camera zoom 2"),
            SceneError::UnknownAttribute { line: 1, .. }
        ));
        assert!(matches!(
            error_of("mesh m cube\nmodel a position 0 0 0"),
            SceneError::Missing { line: 2, .. }
        ));
        assert!(matches!(
            error_of("light l radius 5"),
            SceneError::Missing { line: 1, .. }
        ));
        assert!(matches!(
            error_of("camera position 1 2 3x"),
            SceneError::Syntax { line: 1, .. }
        ));
    }

    #[test]
    fn test_grid_division_limit() {
        assert!(matches!(
            error_of("mesh g grid 10 70000"),
            SceneError::BadValue { line: 1, .. }
        ));
        assert!(matches!(
            error_of("mesh g grid 10 1025"),
            SceneError::BadValue { line: 1, .. }
        ));
        assert!(matches!(
            error_of("mesh g grid 10 0"),
            SceneError::BadValue { line: 1, .. }
        ));
        let scene = parse_scene("mesh g grid 10 8").unwrap();
        assert_eq!(scene.mesh(MeshId(1)).unwrap().triangles.len(), 128);
    }

    #[test]
    fn test_invalid_projection() {
        let err = error_of("projection near 10 far 5");
        assert!(matches!(err, SceneError::InvalidProjection(_)));
        assert_eq!(
            err.to_string(),
            "invalid projection: far clip must be beyond near clip"
        );
    }
}
