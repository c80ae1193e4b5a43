//! `img` and the `image` object type.
//!
//! Scripts describe an image and hand it to the host image renderer to save:
//!
//! ```lua
//! local banner = img:new(300, 80)
//! banner:setBackground("public/images/banner.png")
//! banner:writeText("Online: 42", 10, 20, 14, "#ffffff")
//! banner:save("public/images/status.png")
//! ```

use ember_runtime::services::{ImageSpec, TextSpec};
use ember_runtime::{host, new_object, object_state, object_state_mut, CapabilityModule};
use mlua::{Table, UserData};
use std::path::{Path, PathBuf};

/// Object type name of images.
pub const IMAGE_TYPE: &str = "image";

const DEFAULT_TEXT_SIZE: f64 = 12.0;
const DEFAULT_TEXT_COLOR: &str = "#000000";

/// `image:writeText(text, x, y, size?, color?)`
type TextArgs = (Table, String, i64, i64, Option<f64>, Option<String>);

/// Host state of an `image` object.
pub struct ImageState {
    spec: ImageSpec,
}

impl ImageState {
    pub fn spec(&self) -> &ImageSpec {
        &self.spec
    }
}

impl UserData for ImageState {}

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("img").function("new", |lua, (width, height): (u32, u32)| {
        if width == 0 || height == 0 {
            return Err(mlua::Error::runtime("img: width and height must be positive"));
        }
        let spec = ImageSpec {
            width,
            height,
            ..ImageSpec::default()
        };
        new_object(lua, IMAGE_TYPE, ImageState { spec })
    })
}

pub fn image_type() -> CapabilityModule {
    CapabilityModule::object_type(IMAGE_TYPE)
        .function(
            "writeText",
            |_, (this, text, x, y, size, color): TextArgs| {
                let mut image = object_state_mut::<ImageState>(&this)?;
                image.spec.texts.push(TextSpec {
                    text,
                    x,
                    y,
                    size: size.unwrap_or(DEFAULT_TEXT_SIZE),
                    color: color.unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
                });
                Ok(())
            },
        )
        .function("setBackground", |_, (this, path): (Table, String)| {
            object_state_mut::<ImageState>(&this)?.spec.background = Some(PathBuf::from(path));
            Ok(())
        })
        .function("save", |lua, (this, path): (Table, String)| {
            let spec = object_state::<ImageState>(&this)?.spec.clone();
            host(lua)?.images()?.save(&spec, Path::new(&path))?;
            Ok(())
        })
}
