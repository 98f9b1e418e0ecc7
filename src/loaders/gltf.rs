use std::path::Path;

use glam::{Mat4, Mat3, Vec3};
use log::{debug, info, warn};

use crate::error::{Result, ViewerError};
use crate::model::{LoadedAsset, MaterialData, MeshData, ModelNode, TextureData, Vertex};

type Document = (gltf::Document, Vec<gltf::buffer::Data>, Vec<gltf::image::Data>);

/// Loads a glTF file (plus sibling buffers/images) into a single model node
pub fn load_model(path: impl AsRef<Path>) -> Result<LoadedAsset> {
    let path = path.as_ref();
    let url = path.display().to_string();
    info!("Loading glTF model: {}", url);

    let document = gltf::import(path).map_err(|e| classify(&url, e))?;
    build_asset(&url, document)
}

/// Loads a self-contained glTF/GLB from memory (buffers must be embedded)
pub fn load_model_slice(name: &str, bytes: &[u8]) -> Result<LoadedAsset> {
    let document = gltf::import_slice(bytes).map_err(|e| classify(name, e))?;
    build_asset(name, document)
}

/// I/O problems are fetch failures; everything else is malformed content
fn classify(url: &str, error: gltf::Error) -> ViewerError {
    match error {
        gltf::Error::Io(e) => ViewerError::AssetFetch {
            url: url.to_string(),
            reason: e.to_string(),
        },
        other => ViewerError::AssetParse {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}

fn build_asset(url: &str, (gltf, buffers, images): Document) -> Result<LoadedAsset> {
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| ViewerError::AssetParse {
            url: url.to_string(),
            reason: "document contains no scenes".to_string(),
        })?;

    let materials = load_materials(&gltf);
    let textures = images.iter().map(convert_image).collect::<Vec<_>>();

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        process_node(url, &node, &buffers, &Mat4::IDENTITY, &mut meshes)?;
    }

    let node = ModelNode {
        name: scene.name().map(str::to_string),
        meshes,
        materials,
        textures,
        ..Default::default()
    };

    if node.meshes.is_empty() {
        warn!("glTF model {} contains no triangle geometry", url);
    }

    info!(
        "Loaded {}: {} meshes, {} triangles, {} materials, {} textures",
        url,
        node.meshes.len(),
        node.triangle_count(),
        node.materials.len(),
        node.textures.len()
    );

    Ok(LoadedAsset::new(node))
}

fn load_materials(gltf: &gltf::Document) -> Vec<MaterialData> {
    gltf.materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let base_color = pbr.base_color_factor();

            match pbr.base_color_texture() {
                Some(info) => {
                    let image = info.texture().source().index();
                    MaterialData::new_textured(base_color, image)
                }
                None => MaterialData::new_color(base_color),
            }
        })
        .collect()
}

fn convert_image(image: &gltf::image::Data) -> TextureData {
    use gltf::image::Format;

    let pixels = &image.pixels;
    let data = match image.format {
        Format::R8G8B8A8 => pixels.clone(),
        Format::R8G8B8 => expand_to_rgba(pixels, 3),
        Format::R8G8 => expand_to_rgba(pixels, 2),
        Format::R8 => expand_to_rgba(pixels, 1),
        Format::R16G16B16A16 => high_bytes(pixels),
        Format::R16G16B16 => expand_to_rgba(&high_bytes(pixels), 3),
        Format::R16G16 => expand_to_rgba(&high_bytes(pixels), 2),
        Format::R16 => expand_to_rgba(&high_bytes(pixels), 1),
        other => {
            warn!("Unsupported texture format {:?}, substituting white", other);
            return TextureData::white(image.width, image.height);
        }
    };

    TextureData {
        width: image.width,
        height: image.height,
        data,
    }
}

/// 8-bit channels of `channels`-wide pixels widened to RGBA8
///
/// Grey images replicate their single channel; two-channel images keep R and G.
fn expand_to_rgba(pixels: &[u8], channels: usize) -> Vec<u8> {
    pixels
        .chunks_exact(channels)
        .flat_map(|px| match px {
            &[l] => [l, l, l, 255],
            &[r, g] => [r, g, 0, 255],
            &[r, g, b] => [r, g, b, 255],
            _ => [px[0], px[1], px[2], px[3]],
        })
        .collect()
}

/// Most significant byte of each native-endian 16-bit channel
fn high_bytes(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(2)
        .map(|c| (u16::from_ne_bytes([c[0], c[1]]) >> 8) as u8)
        .collect()
}

fn process_node(
    url: &str,
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent_transform: &Mat4,
    meshes: &mut Vec<MeshData>,
) -> Result<()> {
    let local_transform = Mat4::from_cols_array_2d(&node.transform().matrix());
    let global_transform = *parent_transform * local_transform;

    if let Some(mesh) = node.mesh() {
        process_mesh(url, &mesh, buffers, &global_transform, meshes)?;
    }

    for child in node.children() {
        process_node(url, &child, buffers, &global_transform, meshes)?;
    }

    Ok(())
}

fn process_mesh(
    url: &str,
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    transform: &Mat4,
    meshes: &mut Vec<MeshData>,
) -> Result<()> {
    let normal_matrix = Mat3::from_mat4(*transform).inverse().transpose();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            debug!("Skipping non-triangle primitive in mesh {:?}", mesh.name());
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b.0[..]));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| ViewerError::AssetParse {
                url: url.to_string(),
                reason: format!("mesh {:?} primitive has no positions", mesh.name()),
            })?
            .map(|p| transform.transform_point3(Vec3::from_array(p)))
            .collect();

        if positions.is_empty() {
            continue;
        }

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(ViewerError::AssetParse {
                url: url.to_string(),
                reason: format!("index {} out of range for {} vertices", bad, positions.len()),
            });
        }
        let indices = trim_to_triangles(indices);

        let normals: Vec<Vec3> = match reader.read_normals() {
            Some(normals) => normals
                .map(|n| (normal_matrix * Vec3::from_array(n)).normalize_or_zero())
                .collect(),
            None => compute_normals(&positions, &indices),
        };

        let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
            Some(uvs) => uvs.into_f32().collect(),
            None => vec![[0.0, 0.0]; positions.len()],
        };

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, p)| Vertex {
                position: p.to_array(),
                normal: normals.get(i).copied().unwrap_or(Vec3::Y).to_array(),
                uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect();

        meshes.push(MeshData {
            name: mesh.name().map(str::to_string),
            vertices,
            indices,
            // no index means the glTF default material, which no slot holds
            material: primitive.material().index().unwrap_or(usize::MAX),
        });
    }

    Ok(())
}

fn trim_to_triangles(mut indices: Vec<u32>) -> Vec<u32> {
    let whole = indices.len() - indices.len() % 3;
    indices.truncate(whole);
    indices
}

/// Area-weighted vertex normals for meshes that ship without them
fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    normals
        .into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            if n == Vec3::ZERO { Vec3::Y } else { n }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_normals_for_flat_triangle() {
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let normals = compute_normals(&positions, &[0, 1, 2]);

        for n in normals {
            assert!((n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_unreferenced_vertex_gets_up_normal() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
        let normals = compute_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals[3], Vec3::Y);
    }

    #[test]
    fn test_trim_to_triangles() {
        assert_eq!(trim_to_triangles(vec![0, 1, 2, 3, 4]), vec![0, 1, 2]);
        assert_eq!(trim_to_triangles(vec![]), Vec::<u32>::new());
    }

    fn image(format: gltf::image::Format, pixels: Vec<u8>) -> gltf::image::Data {
        gltf::image::Data {
            pixels,
            format,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_sixteen_bit_rgb_keeps_high_byte() {
        let pixels = [0xABCDu16, 0x1234, 0xFF00]
            .iter()
            .flat_map(|c| c.to_ne_bytes())
            .collect();
        let texture = convert_image(&image(gltf::image::Format::R16G16B16, pixels));

        assert_eq!(texture.data, vec![0xAB, 0x12, 0xFF, 255]);
    }

    #[test]
    fn test_sixteen_bit_rgba_keeps_alpha() {
        let pixels = [0xFFFFu16, 0x0000, 0x8000, 0x7F00]
            .iter()
            .flat_map(|c| c.to_ne_bytes())
            .collect();
        let texture = convert_image(&image(gltf::image::Format::R16G16B16A16, pixels));

        assert_eq!(texture.data, vec![0xFF, 0x00, 0x80, 0x7F]);
    }

    #[test]
    fn test_grey_expands_to_rgba() {
        let texture = convert_image(&image(gltf::image::Format::R8, vec![42]));
        assert_eq!(texture.data, vec![42, 42, 42, 255]);
    }

    #[test]
    fn test_garbage_bytes_are_parse_errors() {
        let err = load_model_slice("junk.gltf", b"{ this is not gltf").unwrap_err();
        assert!(matches!(err, ViewerError::AssetParse { .. }));
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let err = load_model("definitely/not/here/scene.gltf").unwrap_err();
        assert!(matches!(err, ViewerError::AssetFetch { .. }), "got {err:?}");
    }
}
