use web_sys::{
    WebGl2RenderingContext, WebGlBuffer, WebGlFramebuffer, WebGlProgram, WebGlRenderbuffer,
    WebGlTexture, WebGlUniformLocation, WebGlVertexArrayObject,
};

use super::shaders::*;
use super::webgl::WebGLContext;
use crate::config::{
    FloorConfig, LightingConfig, NeedleMaterial, PostConfig, SceneConfig, TrunkConfig,
    MAX_POINT_LIGHTS,
};
use crate::error::Result;
use crate::math::{parse_hex, Mat4, Vec3};
use crate::mesh::{grid_lines, primitives, Geometry, Material, Mesh, Tint};
use crate::morph::{InstanceScratch, Transform, TransformSink};
use crate::particles::{DecorationKind, POINT_FLOATS};

type GL = WebGl2RenderingContext;

/// Which instance buffer a batch draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKey {
    Particles,
    Decorations(DecorationKind),
    Trunk,
}

/// Lights and fog with colors resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    pub background: Vec3,
    pub fog_color: Vec3,
    pub fog_near: f32,
    pub fog_far: f32,
    /// Color times intensity
    pub ambient: Vec3,
    pub points: Vec<PointLight>,
    pub spot: Option<SpotLight>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub radiance: Vec3,
    pub position: Vec3,
    pub distance: f32,
    pub decay: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    pub radiance: Vec3,
    pub position: Vec3,
    pub direction: Vec3,
    pub cos_outer: f32,
    pub cos_inner: f32,
}

impl Lighting {
    pub fn from_config(config: &LightingConfig) -> Result<Self> {
        let points = config
            .point_lights
            .iter()
            .take(MAX_POINT_LIGHTS)
            .map(|l| {
                Ok(PointLight {
                    radiance: parse_hex(&l.color)? * l.intensity,
                    position: l.position,
                    distance: l.distance,
                    decay: l.decay,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let spot = match &config.spot {
            Some(s) => Some(SpotLight {
                radiance: parse_hex(&s.color)? * s.intensity,
                position: s.position,
                direction: (s.target - s.position).normalize(),
                cos_outer: s.angle.cos(),
                cos_inner: (s.angle * (1.0 - s.penumbra.clamp(0.0, 1.0))).cos(),
            }),
            None => None,
        };

        Ok(Self {
            background: parse_hex(&config.background)?,
            fog_color: parse_hex(&config.fog_color)?,
            fog_near: config.fog_near,
            fog_far: config.fog_far,
            ambient: parse_hex(&config.ambient_color)? * config.ambient_intensity,
            points,
            spot,
        })
    }
}

pub fn needle_material(config: &NeedleMaterial) -> Result<Material> {
    Ok(Material::standard(Tint::Own, config.metalness, config.roughness)
        .glowing(Tint::Fixed(parse_hex(&config.emissive)?), config.emissive_intensity))
}

pub fn trunk_material(config: &TrunkConfig) -> Result<Material> {
    Ok(Material::standard(Tint::Fixed(parse_hex(&config.color)?), 0.0, 1.0)
        .glowing(Tint::Fixed(parse_hex(&config.emissive)?), config.emissive_intensity)
        .translucent(config.opacity))
}

/// Wireframe floor color: dark base lifted by its emissive glow
pub fn floor_color(config: &FloorConfig) -> Result<Vec3> {
    Ok(parse_hex(&config.color)? + parse_hex(&config.emissive)? * config.emissive_intensity)
}

/// Per-frame camera and scene state
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub time: f32,
    pub trunk_visible: bool,
}

/// Cached uniform locations for the lit mesh shader
struct MeshUniforms {
    group: Option<WebGlUniformLocation>,
    part: Option<WebGlUniformLocation>,
    view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    camera_pos: Option<WebGlUniformLocation>,
    tint: Option<WebGlUniformLocation>,
    tint_own: Option<WebGlUniformLocation>,
    emissive: Option<WebGlUniformLocation>,
    emissive_own: Option<WebGlUniformLocation>,
    emissive_intensity: Option<WebGlUniformLocation>,
    metalness: Option<WebGlUniformLocation>,
    roughness: Option<WebGlUniformLocation>,
    opacity: Option<WebGlUniformLocation>,
    unlit: Option<WebGlUniformLocation>,
    ambient: Option<WebGlUniformLocation>,
    point_count: Option<WebGlUniformLocation>,
    point_color: [Option<WebGlUniformLocation>; MAX_POINT_LIGHTS],
    point_position: [Option<WebGlUniformLocation>; MAX_POINT_LIGHTS],
    point_distance: [Option<WebGlUniformLocation>; MAX_POINT_LIGHTS],
    point_decay: [Option<WebGlUniformLocation>; MAX_POINT_LIGHTS],
    spot_enabled: Option<WebGlUniformLocation>,
    spot_color: Option<WebGlUniformLocation>,
    spot_position: Option<WebGlUniformLocation>,
    spot_direction: Option<WebGlUniformLocation>,
    spot_cos_outer: Option<WebGlUniformLocation>,
    spot_cos_inner: Option<WebGlUniformLocation>,
    fog_color: Option<WebGlUniformLocation>,
    fog_near: Option<WebGlUniformLocation>,
    fog_far: Option<WebGlUniformLocation>,
}

impl MeshUniforms {
    fn locate(ctx: &WebGLContext, program: &WebGlProgram) -> Self {
        let at = |name: &str| ctx.get_uniform_location(program, name);
        let slots = |name: &str| {
            let mut slots: [Option<WebGlUniformLocation>; MAX_POINT_LIGHTS] = Default::default();
            for (i, slot) in slots.iter_mut().enumerate() {
                *slot = at(&format!("{}[{}]", name, i));
            }
            slots
        };

        Self {
            group: at("u_group"),
            part: at("u_part"),
            view: at("u_view"),
            projection: at("u_projection"),
            camera_pos: at("u_camera_pos"),
            tint: at("u_tint"),
            tint_own: at("u_tint_own"),
            emissive: at("u_emissive"),
            emissive_own: at("u_emissive_own"),
            emissive_intensity: at("u_emissive_intensity"),
            metalness: at("u_metalness"),
            roughness: at("u_roughness"),
            opacity: at("u_opacity"),
            unlit: at("u_unlit"),
            ambient: at("u_ambient"),
            point_count: at("u_point_count"),
            point_color: slots("u_point_color"),
            point_position: slots("u_point_position"),
            point_distance: slots("u_point_distance"),
            point_decay: slots("u_point_decay"),
            spot_enabled: at("u_spot_enabled"),
            spot_color: at("u_spot_color"),
            spot_position: at("u_spot_position"),
            spot_direction: at("u_spot_direction"),
            spot_cos_outer: at("u_spot_cos_outer"),
            spot_cos_inner: at("u_spot_cos_inner"),
            fog_color: at("u_fog_color"),
            fog_near: at("u_fog_near"),
            fog_far: at("u_fog_far"),
        }
    }
}

struct PointUniforms {
    view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    point_scale: Option<WebGlUniformLocation>,
}

struct LineUniforms {
    model: Option<WebGlUniformLocation>,
    view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
    opacity: Option<WebGlUniformLocation>,
    camera_pos: Option<WebGlUniformLocation>,
    fog_color: Option<WebGlUniformLocation>,
    fog_near: Option<WebGlUniformLocation>,
    fog_far: Option<WebGlUniformLocation>,
}

/// Cached uniform locations for post-processing
struct PostUniforms {
    extract_texture: Option<WebGlUniformLocation>,
    threshold: Option<WebGlUniformLocation>,
    blur_texture: Option<WebGlUniformLocation>,
    direction: Option<WebGlUniformLocation>,
    spread: Option<WebGlUniformLocation>,
    scene: Option<WebGlUniformLocation>,
    bloom: Option<WebGlUniformLocation>,
    bloom_intensity: Option<WebGlUniformLocation>,
    exposure: Option<WebGlUniformLocation>,
    noise_opacity: Option<WebGlUniformLocation>,
    vignette_offset: Option<WebGlUniformLocation>,
    vignette_darkness: Option<WebGlUniformLocation>,
    time: Option<WebGlUniformLocation>,
}

/// GPU copy of one instance set
struct InstanceBuffer {
    buffer: WebGlBuffer,
    count: i32,
}

/// One mesh drawn once per instance of its key
struct PartBatch {
    key: BatchKey,
    vao: WebGlVertexArrayObject,
    vertex_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
    local: Mat4,
    material: Material,
}

/// Dynamic point-sprite buffer (stars, sparkles)
struct PointBatch {
    vao: WebGlVertexArrayObject,
    buffer: WebGlBuffer,
    count: i32,
    scale: f32,
}

/// Offscreen targets for the post chain
struct RenderTargets {
    scene_texture: WebGlTexture,
    scene_depth: WebGlRenderbuffer,
    scene_fbo: WebGlFramebuffer,
    bloom_textures: [WebGlTexture; 2],
    bloom_fbos: [WebGlFramebuffer; 2],
}

impl RenderTargets {
    fn create(ctx: &WebGLContext, width: i32, height: i32) -> Result<Self> {
        let scene_texture = ctx.create_texture(width, height)?;
        let scene_depth = ctx.create_depth_buffer(width, height)?;
        let scene_fbo = ctx.create_framebuffer(&scene_texture, Some(&scene_depth))?;

        // Bloom at half resolution
        let (bw, bh) = ((width / 2).max(1), (height / 2).max(1));
        let bloom_a = ctx.create_texture(bw, bh)?;
        let bloom_b = ctx.create_texture(bw, bh)?;
        let fbo_a = ctx.create_framebuffer(&bloom_a, None)?;
        let fbo_b = ctx.create_framebuffer(&bloom_b, None)?;

        Ok(Self {
            scene_texture,
            scene_depth,
            scene_fbo,
            bloom_textures: [bloom_a, bloom_b],
            bloom_fbos: [fbo_a, fbo_b],
        })
    }

    fn delete(&self, gl: &GL) {
        gl.delete_framebuffer(Some(&self.scene_fbo));
        gl.delete_renderbuffer(Some(&self.scene_depth));
        gl.delete_texture(Some(&self.scene_texture));
        for (fbo, tex) in self.bloom_fbos.iter().zip(&self.bloom_textures) {
            gl.delete_framebuffer(Some(fbo));
            gl.delete_texture(Some(tex));
        }
    }
}

/// Complete render pipeline for the scene
pub struct RenderPipeline {
    ctx: WebGLContext,

    mesh_program: WebGlProgram,
    point_program: WebGlProgram,
    line_program: WebGlProgram,
    bloom_extract_program: WebGlProgram,
    blur_program: WebGlProgram,
    composite_program: WebGlProgram,

    mesh_uniforms: MeshUniforms,
    point_uniforms: PointUniforms,
    line_uniforms: LineUniforms,
    post_uniforms: PostUniforms,

    lighting: Lighting,
    post: PostConfig,
    group: Mat4,
    needle: Material,

    particle_instances: Option<InstanceBuffer>,
    decoration_instances: [Option<InstanceBuffer>; 3],
    trunk_instances: InstanceBuffer,
    batches: Vec<PartBatch>,

    stars: PointBatch,
    sparkles: PointBatch,

    floor_vao: WebGlVertexArrayObject,
    floor_buffer: WebGlBuffer,
    floor_vertex_count: i32,
    floor_model: Mat4,
    floor_color: Vec3,
    floor_opacity: f32,

    targets: RenderTargets,
    width: i32,
    height: i32,
}

impl RenderPipeline {
    pub fn new(gl: WebGl2RenderingContext, width: i32, height: i32, config: &SceneConfig) -> Result<Self> {
        let ctx = WebGLContext::new(gl);
        let (width, height) = (width.max(1), height.max(1));

        let mesh_program = ctx.create_program(MESH_VERTEX_SHADER, MESH_FRAGMENT_SHADER)?;
        let point_program = ctx.create_program(POINT_VERTEX_SHADER, POINT_FRAGMENT_SHADER)?;
        let line_program = ctx.create_program(LINE_VERTEX_SHADER, LINE_FRAGMENT_SHADER)?;
        let bloom_extract_program = ctx.create_program(FULLSCREEN_VERTEX_SHADER, BLOOM_EXTRACT_SHADER)?;
        let blur_program = ctx.create_program(FULLSCREEN_VERTEX_SHADER, BLUR_SHADER)?;
        let composite_program = ctx.create_program(FULLSCREEN_VERTEX_SHADER, COMPOSITE_SHADER)?;

        let mesh_uniforms = MeshUniforms::locate(&ctx, &mesh_program);

        let point_uniforms = PointUniforms {
            view: ctx.get_uniform_location(&point_program, "u_view"),
            projection: ctx.get_uniform_location(&point_program, "u_projection"),
            point_scale: ctx.get_uniform_location(&point_program, "u_point_scale"),
        };

        let line_uniforms = LineUniforms {
            model: ctx.get_uniform_location(&line_program, "u_model"),
            view: ctx.get_uniform_location(&line_program, "u_view"),
            projection: ctx.get_uniform_location(&line_program, "u_projection"),
            color: ctx.get_uniform_location(&line_program, "u_color"),
            opacity: ctx.get_uniform_location(&line_program, "u_opacity"),
            camera_pos: ctx.get_uniform_location(&line_program, "u_camera_pos"),
            fog_color: ctx.get_uniform_location(&line_program, "u_fog_color"),
            fog_near: ctx.get_uniform_location(&line_program, "u_fog_near"),
            fog_far: ctx.get_uniform_location(&line_program, "u_fog_far"),
        };

        let post_uniforms = PostUniforms {
            extract_texture: ctx.get_uniform_location(&bloom_extract_program, "u_texture"),
            threshold: ctx.get_uniform_location(&bloom_extract_program, "u_threshold"),
            blur_texture: ctx.get_uniform_location(&blur_program, "u_texture"),
            direction: ctx.get_uniform_location(&blur_program, "u_direction"),
            spread: ctx.get_uniform_location(&blur_program, "u_spread"),
            scene: ctx.get_uniform_location(&composite_program, "u_scene"),
            bloom: ctx.get_uniform_location(&composite_program, "u_bloom"),
            bloom_intensity: ctx.get_uniform_location(&composite_program, "u_bloom_intensity"),
            exposure: ctx.get_uniform_location(&composite_program, "u_exposure"),
            noise_opacity: ctx.get_uniform_location(&composite_program, "u_noise_opacity"),
            vignette_offset: ctx.get_uniform_location(&composite_program, "u_vignette_offset"),
            vignette_darkness: ctx.get_uniform_location(&composite_program, "u_vignette_darkness"),
            time: ctx.get_uniform_location(&composite_program, "u_time"),
        };

        // Trunk: a single static instance at its configured position
        let mut trunk_scratch = InstanceScratch::with_count(1);
        trunk_scratch.write(
            0,
            &Transform {
                position: config.trunk.position,
                ..Transform::default()
            },
            Vec3::ONE,
        );
        let trunk_instances = InstanceBuffer {
            buffer: ctx.create_buffer_f32(trunk_scratch.as_slice(), GL::STATIC_DRAW)?,
            count: 1,
        };
        let trunk_mesh = primitives::cylinder(
            config.trunk.radius_top,
            config.trunk.radius_bottom,
            config.trunk.height,
            config.trunk.segments,
        );
        let trunk_batch = Self::create_batch(
            &ctx,
            BatchKey::Trunk,
            &trunk_mesh,
            &trunk_instances.buffer,
            Mat4::identity(),
            trunk_material(&config.trunk)?,
        )?;

        let stars = Self::create_point_batch(&ctx, 30.0)?;
        let sparkles = Self::create_point_batch(&ctx, 25.0)?;

        let floor_data = grid_lines(config.floor.size, config.floor.segments);
        let floor_vao = ctx.create_vao()?;
        ctx.gl.bind_vertex_array(Some(&floor_vao));
        let floor_buffer = ctx.create_buffer_f32(&floor_data, GL::STATIC_DRAW)?;
        ctx.gl.bind_buffer(GL::ARRAY_BUFFER, Some(&floor_buffer));
        ctx.float_attribute(0, 3, 12, 0);
        ctx.gl.bind_vertex_array(None);

        let targets = RenderTargets::create(&ctx, width, height)?;

        let group = config.group_offset.0;
        log::info!("render pipeline ready at {}x{}", width, height);

        Ok(Self {
            ctx,
            mesh_program,
            point_program,
            line_program,
            bloom_extract_program,
            blur_program,
            composite_program,
            mesh_uniforms,
            point_uniforms,
            line_uniforms,
            post_uniforms,
            lighting: Lighting::from_config(&config.lighting)?,
            post: config.post.clone(),
            group: Mat4::translation(group.x, group.y, group.z),
            needle: needle_material(&config.particles.material)?,
            particle_instances: None,
            decoration_instances: [None, None, None],
            trunk_instances,
            batches: vec![trunk_batch],
            stars,
            sparkles,
            floor_vao,
            floor_buffer,
            floor_vertex_count: (floor_data.len() / 3) as i32,
            floor_model: Mat4::translation(0.0, config.floor.y, 0.0),
            floor_color: floor_color(&config.floor)?,
            floor_opacity: config.floor.opacity,
            targets,
            width,
            height,
        })
    }

    fn create_point_batch(ctx: &WebGLContext, scale: f32) -> Result<PointBatch> {
        let gl = &ctx.gl;
        let vao = ctx.create_vao()?;
        gl.bind_vertex_array(Some(&vao));

        let buffer = ctx.create_buffer_f32(&[], GL::DYNAMIC_DRAW)?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));

        // Layout: position(3) + size(1) + alpha(1) + color(3)
        let stride = (POINT_FLOATS * 4) as i32;
        ctx.float_attribute(0, 3, stride, 0);
        ctx.float_attribute(1, 1, stride, 12);
        ctx.float_attribute(2, 1, stride, 16);
        ctx.float_attribute(3, 3, stride, 20);

        gl.bind_vertex_array(None);
        Ok(PointBatch {
            vao,
            buffer,
            count: 0,
            scale,
        })
    }

    /// Upload a mesh and bind it to an instance buffer in one VAO
    fn create_batch(
        ctx: &WebGLContext,
        key: BatchKey,
        mesh: &Mesh,
        instances: &WebGlBuffer,
        local: Mat4,
        material: Material,
    ) -> Result<PartBatch> {
        let gl = &ctx.gl;

        let vao = ctx.create_vao()?;
        gl.bind_vertex_array(Some(&vao));

        let vertex_buffer = ctx.create_buffer_f32(&mesh.vertex_data(), GL::STATIC_DRAW)?;
        let index_buffer = ctx.create_index_buffer(mesh.index_data())?;

        // Layout: position(3) + normal(3) = 6 floats
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&vertex_buffer));
        ctx.float_attribute(0, 3, 24, 0);
        ctx.float_attribute(1, 3, 24, 12);

        ctx.instance_attributes(instances, 2);

        gl.bind_vertex_array(None);
        gl.bind_buffer(GL::ARRAY_BUFFER, None);

        Ok(PartBatch {
            key,
            vao,
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_data().len() as i32,
            local,
            material,
        })
    }

    /// Create instance buffers and the batches that draw from them.
    ///
    /// Until this succeeds `instances_ready` is false and the engine skips
    /// integration entirely.
    pub fn prepare_instances(&mut self) -> Result<()> {
        if self.instances_ready() {
            return Ok(());
        }

        let particles = self.ctx.create_buffer_f32(&[], GL::DYNAMIC_DRAW)?;
        let needle = Self::create_batch(
            &self.ctx,
            BatchKey::Particles,
            &Geometry::Needle.build(),
            &particles,
            Mat4::identity(),
            self.needle,
        )?;
        self.batches.push(needle);

        let mut decoration_buffers = Vec::with_capacity(3);
        for kind in DecorationKind::ALL {
            let buffer = self.ctx.create_buffer_f32(&[], GL::DYNAMIC_DRAW)?;
            for part in kind.parts() {
                let local = Mat4::from_transform(Vec3::ZERO, part.rotation, Vec3::splat(part.scale));
                let batch = Self::create_batch(
                    &self.ctx,
                    BatchKey::Decorations(kind),
                    &part.geometry.build(),
                    &buffer,
                    local,
                    part.material,
                )?;
                self.batches.push(batch);
            }
            decoration_buffers.push(buffer);
        }

        for (slot, buffer) in self.decoration_instances.iter_mut().zip(decoration_buffers) {
            *slot = Some(InstanceBuffer { buffer, count: 0 });
        }
        self.particle_instances = Some(InstanceBuffer {
            buffer: particles,
            count: 0,
        });

        log::debug!("instance batches ready: {}", self.batches.len());
        Ok(())
    }

    pub fn instances_ready(&self) -> bool {
        self.particle_instances.is_some()
    }

    /// Upload this frame's instance data for one key
    pub fn update_instances(&mut self, key: BatchKey, scratch: &InstanceScratch) {
        let target = match key {
            BatchKey::Particles => self.particle_instances.as_mut(),
            BatchKey::Decorations(kind) => self.decoration_instances[kind.index()].as_mut(),
            BatchKey::Trunk => Some(&mut self.trunk_instances),
        };
        if let Some(instances) = target {
            self.ctx.write_buffer_f32(&instances.buffer, scratch.as_slice(), GL::DYNAMIC_DRAW);
            instances.count = scratch.count() as i32;
        }
    }

    /// Upload star and sparkle sprites (8 floats per point)
    pub fn update_points(&mut self, stars: &[f32], sparkles: &[f32]) {
        for (batch, data) in [(&mut self.stars, stars), (&mut self.sparkles, sparkles)] {
            self.ctx.write_buffer_f32(&batch.buffer, data, GL::DYNAMIC_DRAW);
            batch.count = (data.len() / POINT_FLOATS) as i32;
        }
    }

    fn instance_count(&self, key: BatchKey) -> i32 {
        match key {
            BatchKey::Particles => self.particle_instances.as_ref().map_or(0, |b| b.count),
            BatchKey::Decorations(kind) => self.decoration_instances[kind.index()]
                .as_ref()
                .map_or(0, |b| b.count),
            BatchKey::Trunk => self.trunk_instances.count,
        }
    }

    fn set_scene_uniforms(&self, frame: &RenderFrame) {
        let ctx = &self.ctx;
        let u = &self.mesh_uniforms;
        let lighting = &self.lighting;

        ctx.uniform_matrix4fv(u.group.as_ref(), self.group.as_slice());
        ctx.uniform_matrix4fv(u.view.as_ref(), frame.view.as_slice());
        ctx.uniform_matrix4fv(u.projection.as_ref(), frame.projection.as_slice());
        ctx.uniform_vec3(u.camera_pos.as_ref(), frame.camera_position);

        ctx.uniform_vec3(u.ambient.as_ref(), lighting.ambient);
        ctx.uniform_1i(u.point_count.as_ref(), lighting.points.len() as i32);
        for (i, light) in lighting.points.iter().enumerate() {
            ctx.uniform_vec3(u.point_color[i].as_ref(), light.radiance);
            ctx.uniform_vec3(u.point_position[i].as_ref(), light.position);
            ctx.uniform_1f(u.point_distance[i].as_ref(), light.distance);
            ctx.uniform_1f(u.point_decay[i].as_ref(), light.decay);
        }

        match &lighting.spot {
            Some(spot) => {
                ctx.uniform_1f(u.spot_enabled.as_ref(), 1.0);
                ctx.uniform_vec3(u.spot_color.as_ref(), spot.radiance);
                ctx.uniform_vec3(u.spot_position.as_ref(), spot.position);
                ctx.uniform_vec3(u.spot_direction.as_ref(), spot.direction);
                ctx.uniform_1f(u.spot_cos_outer.as_ref(), spot.cos_outer);
                ctx.uniform_1f(u.spot_cos_inner.as_ref(), spot.cos_inner);
            }
            None => ctx.uniform_1f(u.spot_enabled.as_ref(), 0.0),
        }

        ctx.uniform_vec3(u.fog_color.as_ref(), lighting.fog_color);
        ctx.uniform_1f(u.fog_near.as_ref(), lighting.fog_near);
        ctx.uniform_1f(u.fog_far.as_ref(), lighting.fog_far);
    }

    fn set_material(&self, material: &Material) {
        let ctx = &self.ctx;
        let u = &self.mesh_uniforms;

        let (tint, tint_own) = match material.tint {
            Tint::Own => (Vec3::ZERO, 1.0),
            Tint::Fixed(color) => (color, 0.0),
        };
        let (emissive, emissive_own) = match material.emissive {
            Tint::Own => (Vec3::ZERO, 1.0),
            Tint::Fixed(color) => (color, 0.0),
        };

        ctx.uniform_vec3(u.tint.as_ref(), tint);
        ctx.uniform_1f(u.tint_own.as_ref(), tint_own);
        ctx.uniform_vec3(u.emissive.as_ref(), emissive);
        ctx.uniform_1f(u.emissive_own.as_ref(), emissive_own);
        ctx.uniform_1f(u.emissive_intensity.as_ref(), material.emissive_intensity);
        ctx.uniform_1f(u.metalness.as_ref(), material.metalness);
        ctx.uniform_1f(u.roughness.as_ref(), material.roughness);
        ctx.uniform_1f(u.opacity.as_ref(), material.opacity);
        ctx.uniform_1f(u.unlit.as_ref(), if material.unlit { 1.0 } else { 0.0 });
    }

    fn draw_batches(&self, frame: &RenderFrame, transparent: bool) {
        let gl = &self.ctx.gl;
        for batch in &self.batches {
            if batch.material.is_transparent() != transparent {
                continue;
            }
            if batch.key == BatchKey::Trunk && !frame.trunk_visible {
                continue;
            }
            let count = self.instance_count(batch.key);
            if count == 0 {
                continue;
            }

            self.set_material(&batch.material);
            self.ctx.uniform_matrix4fv(self.mesh_uniforms.part.as_ref(), batch.local.as_slice());
            gl.bind_vertex_array(Some(&batch.vao));
            gl.draw_elements_instanced_with_i32(GL::TRIANGLES, batch.index_count, GL::UNSIGNED_INT, 0, count);
        }
    }

    fn draw_floor(&self, frame: &RenderFrame) {
        let ctx = &self.ctx;
        let u = &self.line_uniforms;
        ctx.gl.use_program(Some(&self.line_program));

        ctx.uniform_matrix4fv(u.model.as_ref(), self.floor_model.as_slice());
        ctx.uniform_matrix4fv(u.view.as_ref(), frame.view.as_slice());
        ctx.uniform_matrix4fv(u.projection.as_ref(), frame.projection.as_slice());
        ctx.uniform_vec3(u.color.as_ref(), self.floor_color);
        ctx.uniform_1f(u.opacity.as_ref(), self.floor_opacity);
        ctx.uniform_vec3(u.camera_pos.as_ref(), frame.camera_position);
        ctx.uniform_vec3(u.fog_color.as_ref(), self.lighting.fog_color);
        ctx.uniform_1f(u.fog_near.as_ref(), self.lighting.fog_near);
        ctx.uniform_1f(u.fog_far.as_ref(), self.lighting.fog_far);

        ctx.gl.bind_vertex_array(Some(&self.floor_vao));
        ctx.gl.draw_arrays(GL::LINES, 0, self.floor_vertex_count);
    }

    fn draw_points(&self, frame: &RenderFrame) {
        let ctx = &self.ctx;
        let u = &self.point_uniforms;
        ctx.gl.use_program(Some(&self.point_program));
        ctx.uniform_matrix4fv(u.view.as_ref(), frame.view.as_slice());
        ctx.uniform_matrix4fv(u.projection.as_ref(), frame.projection.as_slice());

        for batch in [&self.stars, &self.sparkles] {
            if batch.count == 0 {
                continue;
            }
            ctx.uniform_1f(u.point_scale.as_ref(), batch.scale);
            ctx.gl.bind_vertex_array(Some(&batch.vao));
            ctx.gl.draw_arrays(GL::POINTS, 0, batch.count);
        }
    }

    /// Render a frame
    pub fn render(&self, frame: &RenderFrame) {
        let gl = &self.ctx.gl;
        let targets = &self.targets;

        // === Pass 1: Render scene to framebuffer ===
        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&targets.scene_fbo));
        self.ctx.viewport(0, 0, self.width, self.height);
        gl.depth_mask(true);
        self.ctx.clear(self.lighting.background, 1.0);
        self.ctx.enable_depth_test();
        gl.disable(GL::BLEND);

        gl.use_program(Some(&self.mesh_program));
        self.set_scene_uniforms(frame);
        self.draw_batches(frame, false);

        // Translucent geometry reads depth but does not write it
        gl.depth_mask(false);
        self.ctx.enable_blending();
        self.draw_floor(frame);
        gl.use_program(Some(&self.mesh_program));
        self.draw_batches(frame, true);

        self.ctx.enable_additive_blending();
        self.draw_points(frame);

        gl.depth_mask(true);
        gl.bind_vertex_array(None);

        // === Pass 2: Extract bloom ===
        let (bw, bh) = ((self.width / 2).max(1), (self.height / 2).max(1));
        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&targets.bloom_fbos[0]));
        self.ctx.viewport(0, 0, bw, bh);
        gl.disable(GL::DEPTH_TEST);
        gl.disable(GL::BLEND);

        gl.use_program(Some(&self.bloom_extract_program));
        gl.active_texture(GL::TEXTURE0);
        gl.bind_texture(GL::TEXTURE_2D, Some(&targets.scene_texture));
        self.ctx.uniform_1i(self.post_uniforms.extract_texture.as_ref(), 0);
        self.ctx.uniform_1f(self.post_uniforms.threshold.as_ref(), self.post.bloom_threshold);
        gl.draw_arrays(GL::TRIANGLES, 0, 3);

        // === Pass 3-4: Separable blur ===
        gl.use_program(Some(&self.blur_program));
        self.ctx.uniform_1i(self.post_uniforms.blur_texture.as_ref(), 0);
        self.ctx.uniform_1f(self.post_uniforms.spread.as_ref(), 1.0 + 2.0 * self.post.bloom_radius);

        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&targets.bloom_fbos[1]));
        gl.bind_texture(GL::TEXTURE_2D, Some(&targets.bloom_textures[0]));
        self.ctx.uniform_2f(self.post_uniforms.direction.as_ref(), 1.0, 0.0);
        gl.draw_arrays(GL::TRIANGLES, 0, 3);

        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&targets.bloom_fbos[0]));
        gl.bind_texture(GL::TEXTURE_2D, Some(&targets.bloom_textures[1]));
        self.ctx.uniform_2f(self.post_uniforms.direction.as_ref(), 0.0, 1.0);
        gl.draw_arrays(GL::TRIANGLES, 0, 3);

        // === Pass 5: Composite ===
        gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        self.ctx.viewport(0, 0, self.width, self.height);

        gl.use_program(Some(&self.composite_program));

        gl.active_texture(GL::TEXTURE0);
        gl.bind_texture(GL::TEXTURE_2D, Some(&targets.scene_texture));
        self.ctx.uniform_1i(self.post_uniforms.scene.as_ref(), 0);

        gl.active_texture(GL::TEXTURE1);
        gl.bind_texture(GL::TEXTURE_2D, Some(&targets.bloom_textures[0]));
        self.ctx.uniform_1i(self.post_uniforms.bloom.as_ref(), 1);

        let post = &self.post;
        self.ctx.uniform_1f(self.post_uniforms.bloom_intensity.as_ref(), post.bloom_intensity);
        self.ctx.uniform_1f(self.post_uniforms.exposure.as_ref(), post.exposure);
        self.ctx.uniform_1f(self.post_uniforms.noise_opacity.as_ref(), post.noise_opacity);
        self.ctx.uniform_1f(self.post_uniforms.vignette_offset.as_ref(), post.vignette_offset);
        self.ctx.uniform_1f(self.post_uniforms.vignette_darkness.as_ref(), post.vignette_darkness);
        self.ctx.uniform_1f(self.post_uniforms.time.as_ref(), frame.time);

        gl.draw_arrays(GL::TRIANGLES, 0, 3);
        gl.active_texture(GL::TEXTURE0);
    }

    /// Resize the render targets, releasing the old ones
    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.width && height == self.height {
            return Ok(());
        }
        let targets = RenderTargets::create(&self.ctx, width, height)?;
        self.targets.delete(&self.ctx.gl);
        self.targets = targets;
        self.width = width;
        self.height = height;
        Ok(())
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        let gl = &self.ctx.gl;
        self.targets.delete(gl);
        for batch in &self.batches {
            gl.delete_vertex_array(Some(&batch.vao));
            gl.delete_buffer(Some(&batch.vertex_buffer));
            gl.delete_buffer(Some(&batch.index_buffer));
        }
        let instance_buffers = self
            .particle_instances
            .iter()
            .chain(self.decoration_instances.iter().flatten())
            .chain(std::iter::once(&self.trunk_instances));
        for instances in instance_buffers {
            gl.delete_buffer(Some(&instances.buffer));
        }
        for points in [&self.stars, &self.sparkles] {
            gl.delete_vertex_array(Some(&points.vao));
            gl.delete_buffer(Some(&points.buffer));
        }
        gl.delete_vertex_array(Some(&self.floor_vao));
        gl.delete_buffer(Some(&self.floor_buffer));
        for program in [
            &self.mesh_program,
            &self.point_program,
            &self.line_program,
            &self.bloom_extract_program,
            &self.blur_program,
            &self.composite_program,
        ] {
            gl.delete_program(Some(program));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lighting_resolves() {
        let lighting = Lighting::from_config(&LightingConfig::default()).unwrap();
        assert_eq!(lighting.points.len(), 2);
        // #ff007f at intensity 2
        assert!((lighting.points[0].radiance.x - 2.0).abs() < 1e-5);
        assert!((lighting.ambient.z - 0.5 * 224.0 / 255.0).abs() < 1e-5);

        let spot = lighting.spot.unwrap();
        assert!((spot.direction.y + 1.0).abs() < 1e-6);
        assert!((spot.cos_outer - 0.5f32.cos()).abs() < 1e-6);
        // full penumbra fades across the whole cone
        assert!((spot.cos_inner - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_materials_follow_config() {
        let config = SceneConfig::default();
        let needle = needle_material(&config.particles.material).unwrap();
        assert_eq!(needle.tint, Tint::Own);
        assert!((needle.metalness - 0.9).abs() < 1e-6);

        let trunk = trunk_material(&config.trunk).unwrap();
        assert!(trunk.is_transparent());
        assert!((trunk.emissive_intensity - 0.5).abs() < 1e-6);

        let floor = floor_color(&config.floor).unwrap();
        assert!(floor.x > floor.y);
    }
}
