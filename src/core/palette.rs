//! Presentation mapping: protocol → particle color and size

use super::{Protocol, SceneConfig};

/// 8-bit RGB color
pub type Rgb = (u8, u8, u8);

pub const TCP_COLOR: Rgb = (0x00, 0xcc, 0xff); // cool cyan
pub const UDP_COLOR: Rgb = (0xff, 0x00, 0x55); // warm magenta-red
pub const OTHER_COLOR: Rgb = (0x00, 0xff, 0x66); // green

/// Legend entries in display order
pub const LEGEND: &[(Protocol, &str)] = &[
    (Protocol::Tcp, "TCP (Web/Data)"),
    (Protocol::Udp, "UDP (Media/DNS)"),
    (Protocol::Other, "Other"),
];

/// Visual attributes of a particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleStyle {
    pub color: Rgb,
    pub radius: f32,
}

pub fn protocol_color(protocol: Protocol) -> Rgb {
    match protocol {
        Protocol::Tcp => TCP_COLOR,
        Protocol::Udp => UDP_COLOR,
        Protocol::Other => OTHER_COLOR,
    }
}

/// Color for a raw protocol label. Unknown labels get the OTHER color.
pub fn label_color(label: &str) -> Rgb {
    protocol_color(Protocol::from_label(label))
}

pub fn particle_style(protocol: Protocol, config: &SceneConfig) -> ParticleStyle {
    ParticleStyle {
        color: protocol_color(protocol),
        radius: config.particle_radius as f32,
    }
}

/// Normalized RGBA for GPU-style consumers
pub fn to_rgba_f32((r, g, b): Rgb, alpha: f32) -> [f32; 4] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, alpha]
}
