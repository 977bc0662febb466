/// Free-flying camera and perspective projection
use crate::backend::Key;
use crate::transform::Mat4;
use crate::vector::Vec3;

/// Pitch is kept inside +/- this many degrees so the view never flips
pub const PITCH_LIMIT: f32 = 89.0;

/// Keys held during a frame, already mapped to camera actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub yaw_left: bool,
    pub yaw_right: bool,
    pub pitch_up: bool,
    pub pitch_down: bool,
}

impl CameraInput {
    /// WASD moves, Space/LShift rise and sink, arrows turn
    pub fn from_keys<F: Fn(Key) -> bool>(is_down: F) -> Self {
        Self {
            forward: is_down(Key::W),
            backward: is_down(Key::S),
            left: is_down(Key::A),
            right: is_down(Key::D),
            up: is_down(Key::Space),
            down: is_down(Key::LShift),
            yaw_left: is_down(Key::Left),
            yaw_right: is_down(Key::Right),
            pitch_up: is_down(Key::Up),
            pitch_down: is_down(Key::Down),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSpeeds {
    /// Units per second
    pub movement: f32,
    /// Degrees per second; pitch turns at half this rate
    pub rotation: f32,
}

impl Default for CameraSpeeds {
    fn default() -> Self {
        Self {
            movement: 7.0,
            rotation: 50.0,
        }
    }
}

/// Camera position and orientation. Yaw and pitch are in degrees.
///
/// Front and right are recomputed from yaw/pitch whenever they are needed
/// rather than stored, so they cannot drift out of sync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub world_up: Vec3,
}

impl CameraState {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            world_up: Vec3::UNIT_Y,
        }
    }

    pub fn front(&self) -> Vec3 {
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        Vec3::new(cy * cp, sp, sy * cp).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(self.world_up).normalize()
    }

    /// Move along the current front/right axes, then turn.
    ///
    /// Movement uses the orientation from before this frame's rotation; the
    /// view matrix built afterwards already reflects the new rotation.
    pub fn update(&mut self, input: &CameraInput, dt: f32, speeds: &CameraSpeeds) {
        let front = self.front();
        let right = self.right();
        let step = speeds.movement * dt;

        let moves = [
            (input.forward, front),
            (input.backward, -front),
            (input.left, -right),
            (input.right, right),
            (input.up, self.world_up),
            (input.down, -self.world_up),
        ];
        for (held, direction) in moves {
            if held {
                self.position = self.position + direction * step;
            }
        }

        let turn = speeds.rotation * dt;
        if input.yaw_left {
            self.yaw -= turn;
        }
        if input.yaw_right {
            self.yaw += turn;
        }
        if input.pitch_up {
            self.pitch += turn * 0.5;
        }
        if input.pitch_down {
            self.pitch -= turn * 0.5;
        }
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.front(), self.world_up)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 3.0, 12.0), -90.0, -15.0)
    }
}

/// Perspective parameters; the aspect ratio comes from the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    /// A zero-height viewport is treated as square
    pub fn matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        Mat4::perspective(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}
