use crate::config::CameraConfig;
use cgmath::*;
use wgpu::util::DeviceExt;

/// Fixed perspective camera. It never moves after construction; only the
/// projection follows the viewport size.
#[derive(Debug)]
pub struct Camera
{
        pub projection: Projection,
        pub core: CameraCore,
        pub uniform: CameraUniform,
}

impl Camera
{
        pub fn new(config: &CameraConfig) -> Self
        {
                let [x, y, z] = config.position;

                let core = CameraCore::looking_at(Point3::new(x, y, z), Point3::origin());

                let projection = Projection::new(Deg(config.fovy_degrees), config.znear, config.zfar);

                let mut uniform = CameraUniform::new();

                uniform.update_view_proj(&core, &projection);

                Self {
                        projection,
                        core,
                        uniform,
                }
        }

        pub fn resize(
                &mut self,
                width: f32,
                height: f32,
        )
        {
                self.projection.resize(width, height);
                self.uniform.update_view_proj(&self.core, &self.projection);
        }

        pub fn aspect(&self) -> f32
        {
                self.projection.aspect
        }

        pub fn get_buffer(
                &self,
                device: &wgpu::Device,
        ) -> wgpu::Buffer
        {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Camera Buffer"),
                        contents: bytemuck::cast_slice(&[self.uniform]),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                })
        }

        pub fn get_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout
        {
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        entries: &[wgpu::BindGroupLayoutEntry {
                                binding: 0,
                                visibility: wgpu::ShaderStages::VERTEX
                                        | wgpu::ShaderStages::FRAGMENT,
                                ty: wgpu::BindingType::Buffer {
                                        ty: wgpu::BufferBindingType::Uniform,
                                        has_dynamic_offset: false,
                                        min_binding_size: None,
                                },
                                count: None,
                        }],
                        label: Some("camera_bind_group_layout"),
                })
        }

        pub fn get_bind_group(
                device: &wgpu::Device,
                layout: &wgpu::BindGroupLayout,
                buffer: &wgpu::Buffer,
        ) -> wgpu::BindGroup
        {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                        layout,
                        entries: &[wgpu::BindGroupEntry {
                                binding: 0,
                                resource: buffer.as_entire_binding(),
                        }],
                        label: Some("camera_bind_group"),
                })
        }
}

// We need this for Rust to store our data correctly for the shaders
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform
{
        pub view_position: [f32; 4],
        pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform
{
        pub fn new() -> Self
        {
                Self {
                        view_proj: Matrix4::identity().into(),
                        view_position: [0.0; 4],
                }
        }

        pub fn update_view_proj(
                &mut self,
                camera: &CameraCore,
                projection: &Projection,
        )
        {
                self.view_position = camera.position.to_homogeneous().into();
                self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
        }
}

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::from_cols(
    Vector4::new(1.0, 0.0, 0.0, 0.0),
    Vector4::new(0.0, 1.0, 0.0, 0.0),
    Vector4::new(0.0, 0.0, 0.5, 0.0),
    Vector4::new(0.0, 0.0, 0.5, 1.0),
);

#[derive(Debug)]
pub struct CameraCore
{
        pub position: Point3<f32>,
        pub yaw: Rad<f32>,
        pub pitch: Rad<f32>,
}

impl CameraCore
{
        pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
                position: V,
                yaw: Y,
                pitch: P,
        ) -> Self
        {
                Self {
                        position: position.into(),
                        yaw: yaw.into(),
                        pitch: pitch.into(),
                }
        }

        /// Yaw and pitch that point from `position` at `target`.
        pub fn looking_at(
                position: Point3<f32>,
                target: Point3<f32>,
        ) -> Self
        {
                let dir = target - position;

                if dir.magnitude2() == 0.0
                {
                        return Self::new(position, Deg(-90.0), Deg(0.0));
                }

                let dir = dir.normalize();

                Self::new(position, Rad(dir.z.atan2(dir.x)), Rad(dir.y.asin()))
        }

        pub fn calc_matrix(&self) -> Matrix4<f32>
        {
                let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
                let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();

                Matrix4::look_to_rh(
                        self.position,
                        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw)
                                .normalize(),
                        Vector3::unit_y(),
                )
        }
}

#[derive(Debug)]
pub struct Projection
{
        pub aspect: f32,
        pub fovy: Rad<f32>,
        pub znear: f32,
        pub zfar: f32,
}

impl Projection
{
        pub fn new<F: Into<Rad<f32>>>(
                fovy: F,
                znear: f32,
                zfar: f32,
        ) -> Self
        {
                Self {
                        aspect: 1.0,
                        fovy: fovy.into(),
                        znear,
                        zfar,
                }
        }

        pub fn resize(
                &mut self,
                width: f32,
                height: f32,
        )
        {
                self.aspect = width / height;
        }

        pub fn calc_matrix(&self) -> Matrix4<f32>
        {
                OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn default_camera_looks_down_negative_z()
        {
                let core = CameraCore::looking_at(Point3::new(0.0, 0.0, 6.0), Point3::origin());

                let view = core.calc_matrix();
                let origin_in_view = view.transform_point(Point3::origin());

                assert!(origin_in_view.x.abs() < 1e-5);
                assert!(origin_in_view.y.abs() < 1e-5);
                assert!((origin_in_view.z + 6.0).abs() < 1e-5);
        }

        #[test]
        fn resize_sets_exact_aspect()
        {
                let mut camera = Camera::new(&CameraConfig::default());

                camera.resize(1280.0, 720.0);

                assert_eq!(camera.aspect(), 1280.0 / 720.0);
        }
}
