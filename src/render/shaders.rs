/// Vertex shader for instanced meshes: needles, decoration parts, trunk
pub const MESH_VERTEX_SHADER: &str = r#"#version 300 es
precision highp float;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in mat4 a_instance;
layout(location = 6) in vec3 a_color;

uniform mat4 u_group;
uniform mat4 u_part;
uniform mat4 u_view;
uniform mat4 u_projection;

out vec3 v_world_position;
out vec3 v_normal;
out vec3 v_color;

void main() {
    mat4 model = u_group * a_instance * u_part;
    vec4 world_pos = model * vec4(a_position, 1.0);

    v_world_position = world_pos.xyz;
    // Scales are uniform, so the model matrix is fine for normals
    v_normal = mat3(model) * a_normal;
    v_color = a_color;

    gl_Position = u_projection * u_view * world_pos;
}
"#;

/// Fragment shader: ambient + two point lights + spot light, linear fog
pub const MESH_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

in vec3 v_world_position;
in vec3 v_normal;
in vec3 v_color;

uniform vec3 u_camera_pos;

// Material
uniform vec3 u_tint;
uniform float u_tint_own;
uniform vec3 u_emissive;
uniform float u_emissive_own;
uniform float u_emissive_intensity;
uniform float u_metalness;
uniform float u_roughness;
uniform float u_opacity;
uniform float u_unlit;

// Lights
uniform vec3 u_ambient;
uniform int u_point_count;
uniform vec3 u_point_color[2];
uniform vec3 u_point_position[2];
uniform float u_point_distance[2];
uniform float u_point_decay[2];
uniform float u_spot_enabled;
uniform vec3 u_spot_color;
uniform vec3 u_spot_position;
uniform vec3 u_spot_direction;
uniform float u_spot_cos_outer;
uniform float u_spot_cos_inner;

uniform vec3 u_fog_color;
uniform float u_fog_near;
uniform float u_fog_far;

out vec4 fragColor;

vec3 shade(vec3 albedo, vec3 normal, vec3 view_dir, vec3 light_dir, vec3 radiance) {
    float ndotl = max(dot(normal, light_dir), 0.0);
    vec3 diffuse = albedo * (1.0 - u_metalness);

    vec3 f0 = mix(vec3(0.04), albedo, u_metalness);
    float shininess = 2.0 / max(pow(u_roughness, 4.0), 0.001) - 2.0;
    vec3 half_dir = normalize(light_dir + view_dir);
    float spec = pow(max(dot(normal, half_dir), 0.0), min(shininess, 2048.0));
    vec3 specular = f0 * spec * (shininess + 2.0) / 8.0;

    return (diffuse + specular) * radiance * ndotl;
}

void main() {
    vec3 albedo = mix(u_tint, v_color, u_tint_own);
    vec3 emissive = mix(u_emissive, v_color, u_emissive_own) * u_emissive_intensity;

    vec3 color;
    if (u_unlit > 0.5) {
        color = albedo;
    } else {
        vec3 normal = normalize(v_normal);
        vec3 view_dir = normalize(u_camera_pos - v_world_position);
        if (!gl_FrontFacing) {
            normal = -normal;
        }

        color = u_ambient * albedo * (1.0 - u_metalness * 0.5);

        for (int i = 0; i < 2; i++) {
            if (i >= u_point_count) break;
            vec3 to_light = u_point_position[i] - v_world_position;
            float dist = length(to_light);
            float falloff = u_point_distance[i] > 0.0
                ? pow(clamp(1.0 - dist / u_point_distance[i], 0.0, 1.0), u_point_decay[i])
                : 1.0;
            color += shade(albedo, normal, view_dir, to_light / dist, u_point_color[i] * falloff);
        }

        if (u_spot_enabled > 0.5) {
            vec3 to_light = normalize(u_spot_position - v_world_position);
            float cone = smoothstep(u_spot_cos_outer, u_spot_cos_inner, dot(-to_light, u_spot_direction));
            color += shade(albedo, normal, view_dir, to_light, u_spot_color * cone);
        }

        color += emissive;
    }

    float dist = length(v_world_position - u_camera_pos);
    float fog = smoothstep(u_fog_near, u_fog_far, dist);
    color = mix(color, u_fog_color, fog);

    fragColor = vec4(color, u_opacity);
}
"#;

/// Vertex shader for stars and sparkles
/// Layout: position(3) + size(1) + alpha(1) + color(3)
pub const POINT_VERTEX_SHADER: &str = r#"#version 300 es
precision highp float;

layout(location = 0) in vec3 a_position;
layout(location = 1) in float a_size;
layout(location = 2) in float a_alpha;
layout(location = 3) in vec3 a_color;

uniform mat4 u_view;
uniform mat4 u_projection;
uniform float u_point_scale;

out float v_alpha;
out vec3 v_color;

void main() {
    v_alpha = a_alpha;
    v_color = a_color;

    vec4 view_pos = u_view * vec4(a_position, 1.0);
    gl_Position = u_projection * view_pos;
    gl_PointSize = a_size * (u_point_scale / max(-view_pos.z, 0.1));
}
"#;

/// Soft round sprite
pub const POINT_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

in float v_alpha;
in vec3 v_color;

out vec4 fragColor;

void main() {
    vec2 coord = gl_PointCoord - vec2(0.5);
    float dist = length(coord);

    if (dist > 0.5) {
        discard;
    }

    float alpha = v_alpha * (1.0 - dist * 2.0);
    fragColor = vec4(v_color, alpha * alpha);
}
"#;

/// Floor grid lines
pub const LINE_VERTEX_SHADER: &str = r#"#version 300 es
precision highp float;

layout(location = 0) in vec3 a_position;

uniform mat4 u_model;
uniform mat4 u_view;
uniform mat4 u_projection;

out vec3 v_world_position;

void main() {
    vec4 world_pos = u_model * vec4(a_position, 1.0);
    v_world_position = world_pos.xyz;
    gl_Position = u_projection * u_view * world_pos;
}
"#;

pub const LINE_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

in vec3 v_world_position;

uniform vec3 u_color;
uniform float u_opacity;
uniform vec3 u_camera_pos;
uniform vec3 u_fog_color;
uniform float u_fog_near;
uniform float u_fog_far;

out vec4 fragColor;

void main() {
    float fog = smoothstep(u_fog_near, u_fog_far, length(v_world_position - u_camera_pos));
    fragColor = vec4(mix(u_color, u_fog_color, fog), u_opacity);
}
"#;

/// Fullscreen quad vertex shader for post-processing
pub const FULLSCREEN_VERTEX_SHADER: &str = r#"#version 300 es
precision highp float;

out vec2 v_uv;

void main() {
    // Fullscreen triangle
    float x = float((gl_VertexID & 1) << 2);
    float y = float((gl_VertexID & 2) << 1);
    v_uv = vec2(x * 0.5, y * 0.5);
    gl_Position = vec4(x - 1.0, y - 1.0, 0.0, 1.0);
}
"#;

/// Bright-pass with a short smoothing band above the threshold
pub const BLOOM_EXTRACT_SHADER: &str = r#"#version 300 es
precision highp float;

in vec2 v_uv;

uniform sampler2D u_texture;
uniform float u_threshold;

out vec4 fragColor;

void main() {
    vec3 color = texture(u_texture, v_uv).rgb;
    float luma = dot(color, vec3(0.2126, 0.7152, 0.0722));
    float keep = smoothstep(u_threshold, u_threshold + 0.025, luma);
    fragColor = vec4(color * keep, 1.0);
}
"#;

/// Separable 9-tap Gaussian; `u_spread` widens the taps
pub const BLUR_SHADER: &str = r#"#version 300 es
precision highp float;

in vec2 v_uv;

uniform sampler2D u_texture;
uniform vec2 u_direction;
uniform float u_spread;

out vec4 fragColor;

void main() {
    vec2 texel = 1.0 / vec2(textureSize(u_texture, 0));

    float weights[5] = float[](0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);

    vec3 result = texture(u_texture, v_uv).rgb * weights[0];

    for (int i = 1; i < 5; i++) {
        vec2 offset = u_direction * texel * float(i) * u_spread;
        result += texture(u_texture, v_uv + offset).rgb * weights[i];
        result += texture(u_texture, v_uv - offset).rgb * weights[i];
    }

    fragColor = vec4(result, 1.0);
}
"#;

/// Bloom add, exposure + ACES, film grain (screen blend), vignette
pub const COMPOSITE_SHADER: &str = r#"#version 300 es
precision highp float;

in vec2 v_uv;

uniform sampler2D u_scene;
uniform sampler2D u_bloom;
uniform float u_bloom_intensity;
uniform float u_exposure;
uniform float u_noise_opacity;
uniform float u_vignette_offset;
uniform float u_vignette_darkness;
uniform float u_time;

out vec4 fragColor;

vec3 aces(vec3 x) {
    return clamp((x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14), 0.0, 1.0);
}

float grain(vec2 p) {
    return fract(sin(dot(p, vec2(12.9898, 78.233))) * 43758.5453);
}

void main() {
    vec3 scene = texture(u_scene, v_uv).rgb;
    vec3 bloom = texture(u_bloom, v_uv).rgb;

    vec3 color = aces((scene + bloom * u_bloom_intensity) * u_exposure);

    float n = grain(gl_FragCoord.xy + fract(u_time) * 100.0) * u_noise_opacity;
    color = 1.0 - (1.0 - color) * (1.0 - n);

    float d = distance(v_uv, vec2(0.5));
    color *= smoothstep(0.8, u_vignette_offset * 0.799, d * (u_vignette_darkness + u_vignette_offset));

    fragColor = vec4(color, 1.0);
}
"#;
