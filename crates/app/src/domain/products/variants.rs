//! Variant tree edits.
//!
//! Payloads are checked against the stored product before any blob is
//! uploaded ([`plan`]), then applied to a copy of the product once the new
//! images exist ([`apply`]). Colors and sizes are addressed by id; only
//! attachments are matched by position.

use rustc_hash::FxHashSet;

use crate::domain::{
    blobs::BlobUuid,
    products::{
        data::{NewColor, NewSize, ProductChanges, UpdateTarget},
        errors::{ProductsServiceError, Resource},
        records::{ColorUuid, ColorVariant, Product, SizeUuid, SizeVariant},
        validation::{ValidationErrors, amount, new_size, new_sizes, path, required_text},
    },
};

/// A checked color entry whose image is either kept or still to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColorDraft {
    pub(crate) color: String,
    /// `None` when the attachment in the same slot provides the image.
    pub(crate) image: Option<BlobUuid>,
    pub(crate) sizes: Vec<SizeVariant>,
}

/// Check color entries. The first `slots` entries take their image from the
/// attachment at the same index; the rest must name an image in `owned`,
/// each at most once.
pub(crate) fn color_drafts(
    errors: &mut ValidationErrors,
    colors: &[NewColor],
    slots: usize,
    owned: &FxHashSet<BlobUuid>,
) -> Vec<ColorDraft> {
    let mut used = FxHashSet::default();

    colors
        .iter()
        .enumerate()
        .map(|(i, color)| {
            let prefix = path("colors", &i.to_string());
            let label = required_text(errors, path(&prefix, "color"), &color.color);
            let sizes = new_sizes(errors, &path(&prefix, "sizes"), &color.sizes);

            let image = if i < slots {
                None
            } else {
                match color.image {
                    None => {
                        errors.push(path(&prefix, "image"), "is required");
                        None
                    }
                    Some(image) if !owned.contains(&image) => {
                        errors.push(path(&prefix, "image"), "must be an image of this product");
                        None
                    }
                    Some(image) if !used.insert(image) => {
                        errors.push(path(&prefix, "image"), "is already used by another color");
                        None
                    }
                    Some(image) => Some(image),
                }
            };

            ColorDraft {
                color: label,
                image,
                sizes,
            }
        })
        .collect()
}

/// Turn drafts into colors, filling attachment slots from `uploaded`.
pub(crate) fn build_colors(
    drafts: Vec<ColorDraft>,
    uploaded: &[BlobUuid],
) -> Result<Vec<ColorVariant>, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let colors: Vec<ColorVariant> = drafts
        .into_iter()
        .enumerate()
        .filter_map(|(i, draft)| {
            let Some(image) = draft.image.or_else(|| uploaded.get(i).copied()) else {
                errors.push(format!("colors.{i}.image"), "is required");
                return None;
            };

            Some(ColorVariant {
                uuid: ColorUuid::new(),
                color: draft.color,
                image,
                sizes: draft.sizes,
            })
        })
        .collect();

    errors.into_result().map(|()| colors)
}

/// Checked changes for one [`UpdateTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Patch {
    Product {
        name: Option<String>,
        description: Option<String>,
        colors: Option<Vec<ColorDraft>>,
    },
    Color {
        color: ColorUuid,
        label: Option<String>,
        sizes: Option<Vec<SizeVariant>>,
    },
    Size {
        color: ColorUuid,
        size: SizeUuid,
        label: Option<String>,
        price: Option<u64>,
        stock: Option<u64>,
    },
    AppendSize {
        color: ColorUuid,
        size: SizeVariant,
    },
}

/// Check `changes` against `product` for `target`.
///
/// `slots` is the number of attachments that will replace current color
/// images, counted from index zero.
pub(crate) fn plan(
    product: &Product,
    target: UpdateTarget,
    changes: &ProductChanges,
    slots: usize,
) -> Result<Patch, ProductsServiceError> {
    let mut errors = ValidationErrors::new();

    let patch = match target {
        UpdateTarget::Product => {
            let name = changes
                .name
                .as_deref()
                .map(|name| required_text(&mut errors, "name".to_string(), name));

            let colors = changes.colors.as_deref().map(|colors| {
                let owned = product.images().collect();

                color_drafts(&mut errors, colors, slots, &owned)
            });

            Patch::Product {
                name,
                description: changes.description.as_deref().and_then(description),
                colors,
            }
        }
        UpdateTarget::Color(color) => {
            product.color(color).ok_or(ProductsServiceError::NotFound(Resource::Color))?;

            Patch::Color {
                color,
                label: changes
                    .color
                    .as_deref()
                    .map(|label| required_text(&mut errors, "color".to_string(), label)),
                sizes: changes
                    .sizes
                    .as_deref()
                    .map(|sizes| new_sizes(&mut errors, "sizes", sizes)),
            }
        }
        UpdateTarget::Size(color, size) => {
            let existing = product
                .color(color)
                .ok_or(ProductsServiceError::NotFound(Resource::Color))?
                .sizes
                .iter()
                .any(|s| s.uuid == size);

            if existing {
                Patch::Size {
                    color,
                    size,
                    label: changes
                        .size
                        .as_deref()
                        .map(|label| required_text(&mut errors, "size".to_string(), label)),
                    price: changes
                        .price
                        .map(|price| amount(&mut errors, "price".to_string(), price)),
                    stock: changes
                        .stock
                        .map(|stock| amount(&mut errors, "stock".to_string(), stock)),
                }
            } else {
                let appended = NewSize {
                    size: changes.size.clone().unwrap_or_default(),
                    price: changes.price,
                    stock: changes.stock,
                };

                Patch::AppendSize {
                    color,
                    size: new_size(&mut errors, "", &appended),
                }
            }
        }
    };

    errors.into_result()?;

    Ok(patch)
}

/// Apply new images and a checked patch to `product`.
///
/// `uploaded[i]` replaces the image of the color at index `i`.
pub(crate) fn apply(
    product: &mut Product,
    patch: Patch,
    uploaded: &[BlobUuid],
) -> Result<(), ProductsServiceError> {
    for (color, image) in product.colors.iter_mut().zip(uploaded) {
        color.image = *image;
    }

    match patch {
        Patch::Product {
            name,
            description,
            colors,
        } => {
            if let Some(name) = name {
                product.name = name;
            }

            if description.is_some() {
                product.description = description;
            }

            if let Some(drafts) = colors {
                product.colors = build_colors(drafts, uploaded)?;
            }
        }
        Patch::Color {
            color,
            label,
            sizes,
        } => {
            let target = product
                .color_mut(color)
                .ok_or(ProductsServiceError::NotFound(Resource::Color))?;

            if let Some(label) = label {
                target.color = label;
            }

            if let Some(sizes) = sizes {
                target.sizes = sizes;
            }
        }
        Patch::Size {
            color,
            size,
            label,
            price,
            stock,
        } => {
            let target = product
                .color_mut(color)
                .ok_or(ProductsServiceError::NotFound(Resource::Color))?
                .size_mut(size)
                .ok_or(ProductsServiceError::NotFound(Resource::Size))?;

            if let Some(label) = label {
                target.size = label;
            }

            if let Some(price) = price {
                target.price = price;
            }

            if let Some(stock) = stock {
                target.stock = stock;
            }
        }
        Patch::AppendSize { color, size } => {
            product
                .color_mut(color)
                .ok_or(ProductsServiceError::NotFound(Resource::Color))?
                .sizes
                .push(size);
        }
    }

    Ok(())
}

/// Images referenced before the update or uploaded for it that the saved
/// product no longer references, each listed once.
pub(crate) fn superseded(before: &Product, uploaded: &[BlobUuid], after: &Product) -> Vec<BlobUuid> {
    let kept: FxHashSet<BlobUuid> = after.images().collect();
    let mut seen = FxHashSet::default();

    before
        .images()
        .chain(uploaded.iter().copied())
        .filter(|image| !kept.contains(image) && seen.insert(*image))
        .collect()
}

/// Trimmed description, `None` when blank.
pub(crate) fn description(text: &str) -> Option<String> {
    Some(text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
