use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::form_urlencoded;

/// 不转义的字符：字母数字与 `-_.!~*'()`，空格编码为 `%20`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// 百分号编码单个键或值
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// 编码为 `k=v&k=v`，用于查询串与表单体
pub fn stringify(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// 设置有序键值对：已有同名键时原位更新，否则追加
pub fn set_pair(pairs: &mut Vec<(String, String)>, key: String, value: String) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(pair) => pair.1 = value,
        None => pairs.push((key, value)),
    }
}

/// 将查询参数合并到路径上
///
/// `overrides` 中的键覆盖路径里已有的同名参数（重复出现的同名参数合并为一个），
/// 未提及的参数保持原有顺序，新键追加在末尾。
pub fn merge_query(path: &str, overrides: &[(String, String)]) -> String {
    if overrides.is_empty() {
        return path.to_string();
    }

    let (pathname, query) = match path.split_once('?') {
        Some((pathname, query)) => (pathname, query),
        None => (path, ""),
    };

    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    for (key, value) in overrides {
        let mut seen = false;
        pairs.retain_mut(|(k, v)| {
            if k != key {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            *v = value.clone();
            true
        });
        if !seen {
            pairs.push((key.clone(), value.clone()));
        }
    }

    format!("{}?{}", pathname, stringify(&pairs))
}
