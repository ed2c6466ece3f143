//! JSON field helpers for component data
//!
//! Component `save_data`/`load_data` implementations write individual named
//! fields into a JSON object. Loading leaves the target untouched when a key
//! is absent so that older documents keep working after new fields are added.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use super::math::{Quat, Quaternion, Vec2, Vec3, Vec4};

/// Result type for field helpers
pub type FieldResult<T> = Result<T, serde_json::Error>;

fn object_mut(data: &mut Value) -> &mut Map<String, Value> {
    if !data.is_object() {
        *data = Value::Object(Map::new());
    }

    match data {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

/// Store a serializable value under `key`
pub fn store<T: Serialize + ?Sized>(data: &mut Value, key: &str, value: &T) -> FieldResult<()> {
    let value = serde_json::to_value(value)?;
    object_mut(data).insert(key.to_string(), value);
    Ok(())
}

/// Load `key` into `target`, returns whether the key was present
pub fn load<T: DeserializeOwned>(data: &Value, key: &str, target: &mut T) -> FieldResult<bool> {
    match data.get(key) {
        Some(value) if !value.is_null() => {
            *target = T::deserialize(value)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Store a 2D vector as `[x, y]`
pub fn store_vec2(data: &mut Value, key: &str, value: &Vec2) -> FieldResult<()> {
    store(data, key, &[value.x, value.y])
}

/// Load a 2D vector stored as `[x, y]`
pub fn load_vec2(data: &Value, key: &str, target: &mut Vec2) -> FieldResult<bool> {
    let mut raw = [target.x, target.y];
    let found = load(data, key, &mut raw)?;
    *target = Vec2::new(raw[0], raw[1]);
    Ok(found)
}

/// Store a 3D vector as `[x, y, z]`
pub fn store_vec3(data: &mut Value, key: &str, value: &Vec3) -> FieldResult<()> {
    store(data, key, &[value.x, value.y, value.z])
}

/// Load a 3D vector stored as `[x, y, z]`
pub fn load_vec3(data: &Value, key: &str, target: &mut Vec3) -> FieldResult<bool> {
    let mut raw = [target.x, target.y, target.z];
    let found = load(data, key, &mut raw)?;
    *target = Vec3::new(raw[0], raw[1], raw[2]);
    Ok(found)
}

/// Store a 4D vector as `[x, y, z, w]`
pub fn store_vec4(data: &mut Value, key: &str, value: &Vec4) -> FieldResult<()> {
    store(data, key, &[value.x, value.y, value.z, value.w])
}

/// Load a 4D vector stored as `[x, y, z, w]`
pub fn load_vec4(data: &Value, key: &str, target: &mut Vec4) -> FieldResult<bool> {
    let mut raw = [target.x, target.y, target.z, target.w];
    let found = load(data, key, &mut raw)?;
    *target = Vec4::new(raw[0], raw[1], raw[2], raw[3]);
    Ok(found)
}

/// Store a rotation as `[x, y, z, w]`
pub fn store_quat(data: &mut Value, key: &str, value: &Quat) -> FieldResult<()> {
    store(data, key, &[value.i, value.j, value.k, value.w])
}

/// Load a rotation stored as `[x, y, z, w]`, renormalized on load
pub fn load_quat(data: &Value, key: &str, target: &mut Quat) -> FieldResult<bool> {
    let mut raw = [target.i, target.j, target.k, target.w];
    let found = load(data, key, &mut raw)?;
    *target = Quat::new_normalize(Quaternion::new(raw[3], raw[0], raw[1], raw[2]));
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_missing_key_keeps_target() {
        let data = serde_json::json!({ "other": 1 });
        let mut value = 42_i32;

        assert!(!load(&data, "order", &mut value).unwrap());
        assert_eq!(value, 42);
    }

    #[test]
    fn test_store_on_non_object_replaces_value() {
        let mut data = Value::Null;
        store(&mut data, "order", &7).unwrap();

        assert_eq!(data["order"], 7);
    }

    #[test]
    fn test_quaternion_component_order() {
        let rotation = Quat::from_euler_angles(0.3, 0.2, 0.1);
        let mut data = Value::Null;
        store_quat(&mut data, "rot", &rotation).unwrap();

        let mut loaded = Quat::identity();
        assert!(load_quat(&data, "rot", &mut loaded).unwrap());
        assert_relative_eq!(loaded, rotation, epsilon = 1e-6);
    }

    #[test]
    fn test_vector_type_mismatch_is_error() {
        let data = serde_json::json!({ "pos": "not a vector" });
        let mut position = Vec3::zeros();

        assert!(load_vec3(&data, "pos", &mut position).is_err());
    }
}
