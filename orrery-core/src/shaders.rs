/// Shader sources for the textured, unlit body pipeline
pub const MODEL_UNIFORM: &str = "uModel";
pub const VIEW_UNIFORM: &str = "uView";
pub const PROJECTION_UNIFORM: &str = "uProj";
pub const TEXTURE_UNIFORM: &str = "uTexture";

pub const VERTEX_SHADER: &str = r#"
#version 330 core
layout(location = 0) in vec3 aPos;
layout(location = 1) in vec2 aTex;

uniform mat4 uModel;
uniform mat4 uView;
uniform mat4 uProj;

out vec2 vTex;

void main()
{
    vTex = aTex;
    gl_Position = uProj * uView * uModel * vec4(aPos, 1.0);
}
"#;

pub const FRAGMENT_SHADER: &str = r#"
#version 330 core
in vec2 vTex;
out vec4 FragColor;

uniform sampler2D uTexture;

void main()
{
    FragColor = texture(uTexture, vTex);
}
"#;
