//! Image selectors and their resolution from project configuration
//!
//! A hook can name an image either by its key in the project config
//! (`imageName: api`, or `imageName: backend.api` for an image of the
//! `backend` dependency) or by an expression (`imageSelector`) which is
//! either `image(key)`, `${runtime.images.key.image}` or a literal image
//! reference.

use crate::config::{Dependency, ImageConfig, ProjectConfig};
use crate::wait::error::{Error, Result};

const DEFAULT_REGISTRY: &str = "docker.io";
const DEFAULT_TAG: &str = "latest";
const RUNTIME_IMAGES_PREFIX: &str = "${runtime.images.";

/// Identifies containers by the image they run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSelector {
    /// Config key the selector was resolved from, if any
    pub config_image_name: Option<String>,
    /// Image reference, optionally tagged
    pub image: String,
}

impl ImageSelector {
    /// Selector for a literal image reference
    pub fn literal(image: impl Into<String>) -> Self {
        Self {
            config_image_name: None,
            image: image.into(),
        }
    }

    /// Check whether a container image matches this selector
    ///
    /// Repositories are compared after normalization (`nginx` equals
    /// `docker.io/library/nginx`). A tag on the selector must match exactly;
    /// an untagged selector matches every tag.
    pub fn matches(&self, image: &str) -> bool {
        let wanted = ImageRef::parse(&self.image);
        let actual = ImageRef::parse(image);

        if wanted.repository != actual.repository {
            return false;
        }
        match wanted.tag {
            Some(tag) => tag == actual.tag.unwrap_or(DEFAULT_TAG),
            None => true,
        }
    }
}

/// Parsed image reference
#[derive(Debug, PartialEq, Eq)]
struct ImageRef<'a> {
    repository: String,
    tag: Option<&'a str>,
}

impl<'a> ImageRef<'a> {
    fn parse(reference: &'a str) -> Self {
        let without_digest = reference.split('@').next().unwrap_or(reference);

        // A colon after the last slash separates the tag; earlier colons belong to a registry port
        let last_slash = without_digest.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match without_digest[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&without_digest[..split], Some(&without_digest[split + 1..]))
            }
            None => (without_digest, None),
        };

        Self {
            repository: normalize_repository(name),
            tag: tag.filter(|t| !t.is_empty()),
        }
    }
}

fn normalize_repository(name: &str) -> String {
    let (registry, path) = match name.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (first, rest)
        }
        _ => (DEFAULT_REGISTRY, name),
    };

    let registry = if registry == "index.docker.io" {
        DEFAULT_REGISTRY
    } else {
        registry
    };

    if registry == DEFAULT_REGISTRY && !path.contains('/') {
        format!("{}/library/{}", registry, path)
    } else {
        format!("{}/{}", registry, path)
    }
}

/// Resolve a config image name (`key` or `dependency.key`) into a selector
///
/// Returns `Ok(None)` when the project declares no such image. Naming a
/// dependency that does not exist is an error.
pub fn resolve_image_name(
    name: &str,
    config: &ProjectConfig,
    dependencies: &[Dependency],
) -> Result<Option<ImageSelector>> {
    if let Some(image) = config.images.get(name) {
        return Ok(Some(tagged_selector(name, name, image, config)));
    }

    let Some((dependency_name, key)) = name.split_once('.') else {
        return Ok(None);
    };

    let dependency = dependencies
        .iter()
        .find(|d| d.name == dependency_name)
        .ok_or_else(|| {
            Error::ImageResolution(format!(
                "dependency '{}' referenced by image '{}' does not exist",
                dependency_name, name
            ))
        })?;

    Ok(dependency
        .config
        .images
        .get(key)
        .map(|image| tagged_selector(name, key, image, &dependency.config)))
}

/// Resolve an image selector expression into a selector
pub fn resolve_image_selector(
    expression: &str,
    config: &ProjectConfig,
    dependencies: &[Dependency],
) -> Result<ImageSelector> {
    let expression = expression.trim();

    if let Some(key) = expression
        .strip_prefix("image(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let key = key.trim();
        return resolve_image_name(key, config, dependencies)?
            .ok_or_else(|| unknown_image(key, expression));
    }

    if let Some(reference) = expression
        .strip_prefix(RUNTIME_IMAGES_PREFIX)
        .and_then(|rest| rest.strip_suffix('}'))
    {
        let (key, field) = reference.rsplit_once('.').ok_or_else(|| {
            Error::ImageResolution(format!("malformed image expression '{}'", expression))
        })?;
        if field != "image" {
            return Err(Error::ImageResolution(format!(
                "image expression '{}' must reference the 'image' field, got '{}'",
                expression, field
            )));
        }

        let resolved =
            resolve_image_name(key, config, dependencies)?.ok_or_else(|| unknown_image(key, expression))?;
        let untagged = ImageRef::parse(&resolved.image);
        return Ok(ImageSelector {
            config_image_name: resolved.config_image_name,
            image: untagged.repository,
        });
    }

    Ok(ImageSelector::literal(expression))
}

fn tagged_selector(
    name: &str,
    key: &str,
    image: &ImageConfig,
    config: &ProjectConfig,
) -> ImageSelector {
    let tag = config
        .built_tag(key)
        .or_else(|| image.tags.first().map(String::as_str));

    let image = match tag {
        Some(tag) => format!("{}:{}", image.image, tag),
        None => image.image.clone(),
    };

    ImageSelector {
        config_image_name: Some(name.to_string()),
        image,
    }
}

fn unknown_image(key: &str, expression: &str) -> Error {
    Error::ImageResolution(format!(
        "image '{}' used in '{}' is not defined in the config",
        key, expression
    ))
}
