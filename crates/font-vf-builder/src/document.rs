//! Reading and writing `.designspace` XML documents.
//!
//! Source filenames in the document are relative to the document location;
//! reading resolves them against the document's directory, writing strips
//! that directory prefix where possible.

use std::{
    collections::HashMap,
    fs::{read_to_string, write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    designspace::{Axis, DesignSpace, Instance, Source},
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "designspace")]
struct DocRoot {
    #[serde(rename = "@format")]
    format: String,
    axes: AxesElem,
    sources: SourcesElem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instances: Option<InstancesElem>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AxesElem {
    #[serde(rename = "axis", default)]
    axes: Vec<AxisElem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AxisElem {
    #[serde(rename = "@tag")]
    tag: String,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@minimum")]
    minimum: f32,
    #[serde(rename = "@maximum")]
    maximum: f32,
    #[serde(rename = "@default")]
    default: f32,
    #[serde(rename = "labelname", default, skip_serializing_if = "Vec::is_empty")]
    label_names: Vec<LabelNameElem>,
    #[serde(rename = "map", default, skip_serializing_if = "Vec::is_empty")]
    map: Vec<MapElem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LabelNameElem {
    #[serde(rename = "@xml:lang")]
    lang: String,
    #[serde(rename = "$text")]
    label: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MapElem {
    #[serde(rename = "@input")]
    input: f32,
    #[serde(rename = "@output")]
    output: f32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SourcesElem {
    #[serde(rename = "source", default)]
    sources: Vec<SourceElem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SourceElem {
    #[serde(rename = "@filename")]
    filename: String,
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "@familyname", default, skip_serializing_if = "Option::is_none")]
    family_name: Option<String>,
    #[serde(rename = "@stylename", default, skip_serializing_if = "Option::is_none")]
    style_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    info: Option<InfoElem>,
    location: LocationElem,
}

#[derive(Debug, Serialize, Deserialize)]
struct InfoElem {
    #[serde(rename = "@copy")]
    copy: u8,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocationElem {
    #[serde(rename = "dimension", default)]
    dimensions: Vec<DimensionElem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DimensionElem {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@xvalue")]
    xvalue: f32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct InstancesElem {
    #[serde(rename = "instance", default)]
    instances: Vec<InstanceElem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct InstanceElem {
    #[serde(rename = "@stylename")]
    style_name: String,
    #[serde(rename = "@familyname", default, skip_serializing_if = "Option::is_none")]
    family_name: Option<String>,
    #[serde(rename = "@filename", default, skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    location: LocationElem,
}

fn location_elem(axes: &[Axis], location: &HashMap<String, f32>) -> LocationElem {
    LocationElem {
        dimensions: axes
            .iter()
            .filter_map(|axis| {
                location.get(&axis.tag).map(|value| DimensionElem {
                    name: axis.name.clone(),
                    xvalue: *value,
                })
            })
            .collect(),
    }
}

/// Location dimensions are keyed by axis name in the document; internally
/// locations are keyed by tag.
fn location_from_elem(elem: &LocationElem, name_to_tag: &HashMap<&str, &str>) -> HashMap<String, f32> {
    elem.dimensions
        .iter()
        .map(|d| {
            let tag = name_to_tag.get(d.name.as_str()).copied().unwrap_or(d.name.as_str());
            (tag.to_string(), d.xvalue)
        })
        .collect()
}

fn doc_from_designspace(ds: &DesignSpace, doc_dir: &Path) -> DocRoot {
    let axes = ds
        .axes
        .iter()
        .map(|axis| AxisElem {
            tag: axis.tag.clone(),
            name: axis.name.clone(),
            minimum: axis.minimum,
            maximum: axis.maximum,
            default: axis.default,
            label_names: axis
                .label_names
                .iter()
                .map(|(lang, label)| LabelNameElem { lang: lang.clone(), label: label.clone() })
                .collect(),
            map: axis
                .map
                .iter()
                .map(|(input, output)| MapElem { input: *input, output: *output })
                .collect(),
        })
        .collect();

    let sources = ds
        .sources
        .iter()
        .map(|source| {
            let filename = source
                .path
                .strip_prefix(doc_dir)
                .unwrap_or(&source.path)
                .to_string_lossy()
                .into_owned();
            SourceElem {
                filename,
                name: Some(source.name.clone()),
                family_name: source.family_name.clone(),
                style_name: source.style_name.clone(),
                info: source.copy_info.then_some(InfoElem { copy: 1 }),
                location: location_elem(&ds.axes, &source.location),
            }
        })
        .collect();

    let instances = (!ds.instances.is_empty()).then(|| InstancesElem {
        instances: ds
            .instances
            .iter()
            .map(|instance| InstanceElem {
                style_name: instance.name.clone(),
                family_name: instance.family_name.clone(),
                filename: instance.filename.clone(),
                location: location_elem(&ds.axes, &instance.location),
            })
            .collect(),
    });

    DocRoot {
        format: "4.0".to_string(),
        axes: AxesElem { axes },
        sources: SourcesElem { sources },
        instances,
    }
}

fn designspace_from_doc(doc: DocRoot, doc_dir: &Path) -> DesignSpace {
    let axes: Vec<Axis> = doc
        .axes
        .axes
        .into_iter()
        .map(|elem| {
            let mut axis = Axis::new(&elem.tag, &elem.name, elem.minimum, elem.default, elem.maximum);
            axis.label_names =
                elem.label_names.into_iter().map(|l| (l.lang, l.label)).collect();
            axis.map = elem.map.into_iter().map(|m| (m.input, m.output)).collect();
            axis
        })
        .collect();

    let name_to_tag: HashMap<&str, &str> =
        axes.iter().map(|a| (a.name.as_str(), a.tag.as_str())).collect();

    let sources = doc
        .sources
        .sources
        .into_iter()
        .map(|elem| {
            let path = doc_dir.join(&elem.filename);
            let mut source = Source::new(path, []);
            if let Some(name) = elem.name {
                source.name = name;
            }
            source.family_name = elem.family_name;
            source.style_name = elem.style_name;
            source.copy_info = elem.info.is_some_and(|i| i.copy != 0);
            source.location = location_from_elem(&elem.location, &name_to_tag);
            source
        })
        .collect();

    let instances = doc
        .instances
        .unwrap_or_default()
        .instances
        .into_iter()
        .map(|elem| {
            let mut instance = Instance::new(&elem.style_name, []);
            instance.family_name = elem.family_name;
            instance.filename = elem.filename;
            instance.location = location_from_elem(&elem.location, &name_to_tag);
            instance
        })
        .collect();

    DesignSpace { axes, sources, instances }
}

/// Serialize a designspace as an XML document, with source paths written
/// relative to `doc_dir`.
pub fn to_xml(ds: &DesignSpace, doc_dir: &Path) -> Result<String> {
    let doc = doc_from_designspace(ds, doc_dir);
    let body = quick_xml::se::to_string(&doc).map_err(|e| Error::DocumentWrite {
        path: doc_dir.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n"))
}

/// Parse a designspace document, resolving source paths against `doc_dir`.
pub fn from_xml(xml: &str, doc_dir: &Path) -> Result<DesignSpace> {
    let doc: DocRoot = quick_xml::de::from_str(xml).map_err(|e| Error::DocumentRead {
        path: doc_dir.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(designspace_from_doc(doc, doc_dir))
}

/// Write a designspace document to `path`.
pub fn write_document(ds: &DesignSpace, path: &Path) -> Result<()> {
    let doc_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let xml = to_xml(ds, doc_dir)?;
    write(path, xml).map_err(|e| Error::DocumentWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read a designspace document from `path`.
pub fn read_document(path: &Path) -> Result<DesignSpace> {
    let xml = read_to_string(path).map_err(|e| Error::DocumentRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let doc_dir = path.parent().unwrap_or_else(|| Path::new(""));
    from_xml(&xml, doc_dir)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn sample_designspace() -> DesignSpace {
        let axes = vec![
            Axis::optical_size(8.0, 14.0, 14.0).with_label_name("en", "Optical size"),
        ];
        let sources = vec![
            Source::new("master_ufo/Lectura-Regular.ufo", vec![("opsz", 14.0)])
                .with_family_name("Lectura")
                .with_style_name("Regular")
                .with_copy_info(),
            Source::new("master_ufo/Lectura-Caption.ufo", vec![("opsz", 8.0)])
                .with_family_name("Lectura")
                .with_style_name("Caption"),
        ];
        let instances = vec![
            Instance::new("Subhead", vec![("opsz", 11.0)])
                .with_family_name("Lectura")
                .with_filename("instances/Lectura-Subhead.ufo"),
        ];
        DesignSpace::new(axes, sources).with_instances(instances)
    }

    #[test]
    fn xml_roundtrip() {
        let ds = sample_designspace();
        let xml = to_xml(&ds, Path::new("")).unwrap();
        let parsed = from_xml(&xml, Path::new("")).unwrap();
        assert_eq!(parsed, ds);
    }

    #[test]
    fn xml_contains_descriptor_fields() {
        let ds = sample_designspace();
        let xml = to_xml(&ds, Path::new("")).unwrap();
        assert!(xml.contains(r#"<axis tag="opsz""#));
        assert!(xml.contains(r#"<labelname xml:lang="en">Optical size</labelname>"#));
        assert!(xml.contains(r#"<info copy="1""#));
        assert!(xml.contains(r#"<dimension name="opsz""#));
        assert!(xml.contains(r#"<instance stylename="Subhead""#));
    }

    #[test]
    fn source_paths_resolve_against_document_dir() {
        let ds = sample_designspace();
        let xml = to_xml(&ds, Path::new("")).unwrap();
        let parsed = from_xml(&xml, Path::new("build")).unwrap();
        assert_eq!(
            parsed.sources[0].path,
            PathBuf::from("build/master_ufo/Lectura-Regular.ufo")
        );
        // Default source survives the trip.
        assert_eq!(parsed.default_source_index(), Some(0));
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Lectura.designspace");
        let ds = sample_designspace();

        // Prefix source paths with the document dir so they relativize.
        let mut on_disk = ds.clone();
        for source in &mut on_disk.sources {
            source.path = dir.path().join(&source.path);
        }

        write_document(&on_disk, &path).unwrap();
        let read_back = read_document(&path).unwrap();
        assert_eq!(read_back, on_disk);
    }
}
