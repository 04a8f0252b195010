use crate::config::Configuration;
use crate::parser::directive::{is_comment, split_key_value};
use crate::parser::query::{set_pair, stringify};

/// `@form` 请求体解析器
///
/// 每行一个字段（`key=value` 或 `key: value`），值可以用多行分隔符包裹（默认 `"""`），
/// 分隔符之间的内容按原样保留，包括换行。
pub struct FormParser<'a> {
    eol: &'a str,
    multiline_start: &'a str,
    multiline_end: &'a str,
}

impl<'a> FormParser<'a> {
    pub fn new(eol: &'a str, multiline_start: &'a str, multiline_end: &'a str) -> Self {
        Self {
            eol,
            multiline_start,
            multiline_end,
        }
    }

    pub fn from_configuration(configuration: &'a Configuration) -> Self {
        Self::new(
            configuration.eol(),
            configuration.multiline_start(),
            configuration.multiline_end(),
        )
    }

    /// 解析并编码为 `application/x-www-form-urlencoded`（空格为 `%20`），没有字段时返回 `None`
    pub fn parse(&self, body: &str) -> Option<String> {
        let lines: Vec<&str> = body.split(self.eol).collect();
        self.parse_lines(&lines)
    }

    pub fn parse_lines(&self, lines: &[&str]) -> Option<String> {
        let fields = self.fields(lines);
        if fields.is_empty() {
            return None;
        }

        Some(stringify(&fields))
    }

    /// 按出现顺序返回字段；重复的键保留首次出现的位置、最后一次的值
    pub fn fields(&self, lines: &[&str]) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        // 正在收集的多行字段：(key, 已收集的值)
        let mut pending: Option<(String, String)> = None;

        for line in lines {
            if let Some((key, mut value)) = pending.take() {
                value.push_str(self.eol);
                match line.find(self.multiline_end) {
                    Some(pos) => {
                        value.push_str(&line[..pos]);
                        set_pair(&mut fields, key, value);
                    }
                    None => {
                        value.push_str(line);
                        pending = Some((key, value));
                    }
                }
                continue;
            }

            // 右侧空白对多行内容有意义，只去掉左侧
            if is_comment(line.trim_start()) {
                continue;
            }

            let Some((key, value)) = split_key_value(line) else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }

            match value.find(self.multiline_start) {
                Some(pos) => {
                    let quoted = &value[pos + self.multiline_start.len()..];
                    match quoted.find(self.multiline_end) {
                        Some(end) => set_pair(&mut fields, key.to_string(), quoted[..end].trim().to_string()),
                        None => pending = Some((key.to_string(), quoted.to_string())),
                    }
                }
                None => set_pair(&mut fields, key.to_string(), value.trim().to_string()),
            }
        }

        if let Some((key, _)) = pending {
            tracing::warn!("Multi-line form field '{}' is never closed, skipping it", key);
        }

        fields
    }
}
