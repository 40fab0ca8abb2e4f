//! Metric-mode projection and group-by splitting.

use crate::error::{BackendError, Result};
use crate::options::EffectiveOptions;
use std::collections::BTreeMap;
use surql_protocol::{DataFrame, Field};

/// Reduce the single result frame to `[time, value]`, plus the group
/// column when grouping is enabled.
pub fn project(frames: &mut [DataFrame], options: &EffectiveOptions) -> Result<()> {
    let [frame] = frames else {
        return Err(BackendError::MultipleFrames);
    };

    let available = frame.field_names();
    let mut fields = std::mem::take(&mut frame.fields);

    // an empty result has no columns at all
    if fields.is_empty() {
        if let Some(group_by) = &options.group {
            return Err(BackendError::MissingField {
                role: "group by",
                name: group_by.clone(),
                available,
            });
        }
        frame.fields = vec![
            Field::new(options.timestamp_field.clone(), Vec::new()),
            Field::new(options.metric_value_field.clone(), Vec::new()),
        ];
        return Ok(());
    }

    let time = take_field(&mut fields, &options.timestamp_field, "time field", &available)?;
    let value = take_field(&mut fields, &options.metric_value_field, "data field", &available)?;
    let mut projected = vec![time, value];
    if let Some(group_by) = &options.group {
        projected.push(take_field(&mut fields, group_by, "group by", &available)?);
    }
    frame.fields = projected;
    Ok(())
}

fn take_field(
    fields: &mut Vec<Field>,
    name: &str,
    role: &'static str,
    available: &str,
) -> Result<Field> {
    let index = fields
        .iter()
        .position(|field| field.name == name)
        .ok_or_else(|| BackendError::MissingField {
            role,
            name: name.to_string(),
            available: available.to_string(),
        })?;
    Ok(fields.remove(index))
}

/// Split a projected `[time, value, group]` frame into one `[time, value]`
/// frame per distinct group value, ordered by group value.
pub fn split_groups(frames: Vec<DataFrame>) -> Result<Vec<DataFrame>> {
    let mut frames = frames;
    let frame = match frames.len() {
        1 => frames.remove(0),
        _ => return Err(BackendError::MultipleFrames),
    };
    let available = frame.field_names();
    let [time, value, group]: [Field; 3] =
        frame
            .fields
            .try_into()
            .map_err(|_| BackendError::MissingField {
                role: "group by",
                name: String::new(),
                available,
            })?;

    let mut groups: BTreeMap<String, (Vec<_>, Vec<_>)> = BTreeMap::new();
    for ((t, v), g) in time.values.into_iter().zip(value.values).zip(&group.values) {
        let entry = groups.entry(g.to_display_string()).or_default();
        entry.0.push(t);
        entry.1.push(v);
    }

    Ok(groups
        .into_iter()
        .map(|(key, (times, values))| DataFrame {
            name: key,
            fields: vec![
                Field::new(time.name.clone(), times),
                Field::new(value.name.clone(), values),
            ],
            meta: frame.meta.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use surql_protocol::{FieldValue, Query, QueryMode};

    fn metric_options(group: bool) -> EffectiveOptions {
        let mut query = Query::new("A", QueryMode::Metric, "x");
        query.metric_value_field = Some("load".to_string());
        query.group_enabled = Some(group);
        query.group_by_field = Some("host".to_string());
        EffectiveOptions::for_query(&query)
    }

    fn frame() -> DataFrame {
        DataFrame::new("A")
            .with_field(Field::new("timestamp", vec![FieldValue::Null; 3]))
            .with_field(Field::new("id", vec!["a".into(), "b".into(), "c".into()]))
            .with_field(Field::new("host", vec!["x".into(), "y".into(), "x".into()]))
            .with_field(Field::new("load", vec![1.0.into(), 2.0.into(), 3.0.into()]))
    }

    #[test]
    fn test_project_keeps_time_and_value() {
        let mut frames = vec![frame()];
        project(&mut frames, &metric_options(false)).unwrap();
        let names: Vec<&str> = frames[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["timestamp", "load"]);
    }

    #[test]
    fn test_project_reports_available_fields() {
        let mut query = Query::new("A", QueryMode::Metric, "x");
        query.metric_value_field = Some("cpu".to_string());
        let mut frames = vec![frame()];
        let err = project(&mut frames, &EffectiveOptions::for_query(&query)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "data field 'cpu' not found in data frame, available are: timestamp, id, host, load"
        );
    }

    #[test]
    fn test_project_empty_frame() {
        let mut frames = vec![DataFrame::new("A")];
        project(&mut frames, &metric_options(false)).unwrap();
        assert_eq!(frames[0].fields.len(), 2);
        assert_eq!(frames[0].row_count(), 0);

        let mut frames = vec![DataFrame::new("A")];
        let err = project(&mut frames, &metric_options(true)).unwrap_err();
        assert!(err.to_string().starts_with("group by 'host' not found"));
    }

    #[test]
    fn test_project_rejects_multiple_frames() {
        let mut frames = vec![frame(), frame()];
        let err = project(&mut frames, &metric_options(false)).unwrap_err();
        assert!(matches!(err, BackendError::MultipleFrames));
    }

    #[test]
    fn test_split_groups() {
        let mut frames = vec![frame()];
        project(&mut frames, &metric_options(true)).unwrap();
        let groups = split_groups(frames).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "x");
        assert_eq!(
            groups[0].field("load").unwrap().values,
            vec![FieldValue::Number(1.0), FieldValue::Number(3.0)]
        );
        assert_eq!(groups[1].name, "y");
        assert_eq!(groups[1].fields.len(), 2);
    }
}
