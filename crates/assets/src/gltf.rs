use crate::AssetError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_JSON: u32 = 0x4E4F_534A;

/// Content-addressed asset ID computed from the file bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        AssetId(u64::from_le_bytes(head))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// What the scene needs to know about an imported model.
///
/// Only the JSON document is read; vertex buffers stay on disk. Bounds come
/// from the `min`/`max` of each primitive's `POSITION` accessor, in model
/// space, ignoring node transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: AssetId,
    pub byte_len: usize,
    pub mesh_names: Vec<String>,
    pub material_count: usize,
    pub node_count: usize,
    pub bounds: Option<(Vec3, Vec3)>,
}

impl ModelInfo {
    pub fn mesh_count(&self) -> usize {
        self.mesh_names.len()
    }

    pub fn size(&self) -> Vec3 {
        self.bounds.map_or(Vec3::ONE, |(lo, hi)| hi - lo)
    }

    pub fn center(&self) -> Vec3 {
        self.bounds.map_or(Vec3::ZERO, |(lo, hi)| (lo + hi) * 0.5)
    }
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Extract the JSON document from a binary glTF container.
fn glb_json_chunk(bytes: &[u8]) -> Result<&[u8], AssetError> {
    if bytes.len() < GLB_HEADER_LEN {
        return Err(AssetError::Truncated("header"));
    }
    let version = read_u32(bytes, 4).ok_or(AssetError::Truncated("header"))?;
    if version != 2 {
        return Err(AssetError::UnsupportedVersion(version));
    }
    let total = read_u32(bytes, 8).ok_or(AssetError::Truncated("header"))? as usize;
    if total > bytes.len() {
        return Err(AssetError::Truncated("declared length exceeds file"));
    }
    let chunk_len =
        read_u32(bytes, GLB_HEADER_LEN).ok_or(AssetError::Truncated("chunk header"))? as usize;
    let chunk_type =
        read_u32(bytes, GLB_HEADER_LEN + 4).ok_or(AssetError::Truncated("chunk header"))?;
    if chunk_type != CHUNK_JSON {
        return Err(AssetError::MissingJsonChunk(chunk_type));
    }
    let start = GLB_HEADER_LEN + CHUNK_HEADER_LEN;
    bytes
        .get(start..start + chunk_len)
        .ok_or(AssetError::Truncated("JSON chunk"))
}

/// Parse a `.glb` container or a plain `.gltf` JSON document.
pub fn parse_model(bytes: &[u8]) -> Result<ModelInfo, AssetError> {
    let json_bytes = if bytes.starts_with(GLB_MAGIC) {
        glb_json_chunk(bytes)?
    } else if bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{') {
        bytes
    } else {
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(4)]).into_owned();
        return Err(AssetError::BadMagic(head));
    };
    let doc: serde_json::Value = serde_json::from_slice(json_bytes)?;

    let mesh_names = doc
        .get("meshes")
        .and_then(|m| m.as_array())
        .map(|meshes| {
            meshes
                .iter()
                .enumerate()
                .map(|(i, mesh)| {
                    mesh.get("name")
                        .and_then(|n| n.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("mesh_{i}"))
                })
                .collect()
        })
        .unwrap_or_default();

    let count = |key: &str| {
        doc.get(key)
            .and_then(|v| v.as_array())
            .map_or(0, |a| a.len())
    };

    Ok(ModelInfo {
        id: AssetId::of(bytes),
        byte_len: bytes.len(),
        mesh_names,
        material_count: count("materials"),
        node_count: count("nodes"),
        bounds: position_bounds(&doc),
    })
}

fn vec3_of(value: Option<&serde_json::Value>) -> Option<Vec3> {
    let arr = value?.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    let c = |i: usize| arr[i].as_f64().map(|v| v as f32);
    Some(Vec3::new(c(0)?, c(1)?, c(2)?))
}

fn position_bounds(doc: &serde_json::Value) -> Option<(Vec3, Vec3)> {
    let accessors = doc.get("accessors")?.as_array()?;
    let meshes = doc.get("meshes")?.as_array()?;
    let mut bounds: Option<(Vec3, Vec3)> = None;
    for mesh in meshes {
        let Some(primitives) = mesh.get("primitives").and_then(|p| p.as_array()) else {
            continue;
        };
        for prim in primitives {
            let Some(index) = prim
                .get("attributes")
                .and_then(|a| a.get("POSITION"))
                .and_then(|i| i.as_u64())
            else {
                continue;
            };
            let Some(accessor) = accessors.get(index as usize) else {
                tracing::warn!(index, "POSITION accessor out of range");
                continue;
            };
            let (Some(lo), Some(hi)) = (vec3_of(accessor.get("min")), vec3_of(accessor.get("max")))
            else {
                continue;
            };
            bounds = Some(match bounds {
                None => (lo, hi),
                Some((a, b)) => (a.min(lo), b.max(hi)),
            });
        }
    }
    bounds
}

/// Read and parse a model file.
pub fn import_model(path: impl AsRef<Path>) -> Result<ModelInfo, AssetError> {
    let bytes = std::fs::read(path.as_ref())?;
    let info = parse_model(&bytes)?;
    tracing::debug!(
        path = %path.as_ref().display(),
        id = %info.id,
        meshes = info.mesh_count(),
        "model imported"
    );
    Ok(info)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const CUBE_GLTF: &str = r#"{
        "asset": {"version": "2.0"},
        "meshes": [{"name": "Box", "primitives": [{"attributes": {"POSITION": 0}}]}],
        "materials": [{"name": "Body"}],
        "nodes": [{"mesh": 0}, {"children": [0]}],
        "accessors": [{"count": 24, "min": [-0.5, 0.0, -0.25], "max": [0.5, 2.0, 0.25]}]
    }"#;

    /// Wrap a JSON document in a minimal GLB container.
    pub(crate) fn glb(json: &str) -> Vec<u8> {
        let mut body = json.as_bytes().to_vec();
        while body.len() % 4 != 0 {
            body.push(b' ');
        }
        let total = (GLB_HEADER_LEN + CHUNK_HEADER_LEN + body.len()) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(GLB_MAGIC);
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&total.to_le_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn parses_glb_container() {
        let info = parse_model(&glb(CUBE_GLTF)).unwrap();
        assert_eq!(info.mesh_names, vec!["Box".to_string()]);
        assert_eq!(info.material_count, 1);
        assert_eq!(info.node_count, 2);
        let (lo, hi) = info.bounds.unwrap();
        assert_eq!(lo, Vec3::new(-0.5, 0.0, -0.25));
        assert_eq!(hi, Vec3::new(0.5, 2.0, 0.25));
        assert_eq!(info.size(), Vec3::new(1.0, 2.0, 0.5));
        assert_eq!(info.center(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn parses_plain_gltf_json() {
        let info = parse_model(CUBE_GLTF.as_bytes()).unwrap();
        assert_eq!(info.mesh_count(), 1);
    }

    #[test]
    fn unnamed_meshes_get_indexed_names() {
        let info = parse_model(br#"{"meshes": [{}, {}]}"#).unwrap();
        assert_eq!(info.mesh_names, vec!["mesh_0", "mesh_1"]);
        assert_eq!(info.bounds, None);
        assert_eq!(info.size(), Vec3::ONE);
    }

    #[test]
    fn rejects_unknown_magic() {
        assert!(matches!(
            parse_model(b"PK\x03\x04zip"),
            Err(AssetError::BadMagic(_))
        ));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut bytes = glb(CUBE_GLTF);
        bytes[4..8].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(
            parse_model(&bytes),
            Err(AssetError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn rejects_truncated_container() {
        let bytes = glb(CUBE_GLTF);
        assert!(matches!(
            parse_model(&bytes[..bytes.len() - 10]),
            Err(AssetError::Truncated(_))
        ));
        assert!(matches!(
            parse_model(&bytes[..8]),
            Err(AssetError::Truncated(_))
        ));
    }

    #[test]
    fn rejects_binary_first_chunk() {
        let mut bytes = glb(CUBE_GLTF);
        bytes[16..20].copy_from_slice(&0x004E_4942u32.to_le_bytes());
        assert!(matches!(
            parse_model(&bytes),
            Err(AssetError::MissingJsonChunk(0x004E_4942))
        ));
    }

    #[test]
    fn identical_bytes_share_an_id() {
        let a = parse_model(&glb(CUBE_GLTF)).unwrap();
        let b = parse_model(&glb(CUBE_GLTF)).unwrap();
        let c = parse_model(CUBE_GLTF.as_bytes()).unwrap();
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn import_from_disk() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), glb(CUBE_GLTF)).unwrap();
        let info = import_model(tmp.path()).unwrap();
        assert_eq!(info.byte_len, glb(CUBE_GLTF).len());
    }
}
