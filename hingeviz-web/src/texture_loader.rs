/// Fire-and-forget texture loading through an `<img>` element
use std::cell::RefCell;
use std::rc::Rc;

use hingeviz_core::{HingevizError, Result, TextureImage};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// Where a finished load leaves its result for the next frame
pub type TextureInbox = Rc<RefCell<Option<Result<TextureImage>>>>;

fn load_error(context: &str, err: JsValue) -> HingevizError {
    HingevizError::TextureLoad(format!("{context}: {err:?}"))
}

/// An in-flight image load. Dropping it detaches the callbacks.
pub struct TextureRequest {
    image: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

impl TextureRequest {
    pub fn start(url: &str, inbox: TextureInbox) -> Result<Self> {
        let image = HtmlImageElement::new().map_err(|err| load_error("cannot create image", err))?;

        let onload = {
            let image = image.clone();
            let inbox = Rc::clone(&inbox);
            Closure::<dyn FnMut()>::new(move || {
                *inbox.borrow_mut() = Some(read_pixels(&image));
            })
        };
        let onerror = {
            let url = url.to_string();
            Closure::<dyn FnMut()>::new(move || {
                *inbox.borrow_mut() = Some(Err(HingevizError::TextureLoad(format!("could not load {url}"))));
            })
        };

        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        image.set_cross_origin(Some("anonymous"));
        image.set_src(url);
        log::debug!("loading texture from {url}");

        Ok(Self {
            image,
            _onload: onload,
            _onerror: onerror,
        })
    }
}

impl Drop for TextureRequest {
    fn drop(&mut self) {
        self.image.set_onload(None);
        self.image.set_onerror(None);
    }
}

/// Decode a loaded image into RGBA pixels through a scratch 2D canvas
fn read_pixels(image: &HtmlImageElement) -> Result<TextureImage> {
    let (width, height) = (image.natural_width(), image.natural_height());
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| HingevizError::TextureLoad("no document".to_string()))?;

    let canvas = document
        .create_element("canvas")
        .map_err(|err| load_error("cannot create canvas", err))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| HingevizError::TextureLoad("canvas element has an unexpected type".to_string()))?;
    canvas.set_width(width);
    canvas.set_height(height);

    let context = canvas
        .get_context("2d")
        .map_err(|err| load_error("2d context request failed", err))?
        .ok_or_else(|| HingevizError::TextureLoad("2d context unavailable".to_string()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| HingevizError::TextureLoad("2d context has an unexpected type".to_string()))?;
    context
        .draw_image_with_html_image_element(image, 0.0, 0.0)
        .map_err(|err| load_error("cannot draw image", err))?;
    let data = context
        .get_image_data(0.0, 0.0, f64::from(width), f64::from(height))
        .map_err(|err| load_error("cannot read pixels", err))?;

    TextureImage::from_rgba(width, height, data.data().0)
}
