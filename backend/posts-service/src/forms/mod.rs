/// Forms for user-submitted posts and comments
///
/// A form holds raw submitted values. `clean` checks them against the model
/// constraints and returns either cleaned values ready to persist or
/// per-field error messages. Forms never touch storage: choices they check
/// against (groups) are handed in by the caller.
pub mod multipart;

use serde::Serialize;
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

use crate::models::{Group, Post};

pub use multipart::read_post_form;

pub const REQUIRED_MESSAGE: &str = "Обязательное поле.";
pub const INVALID_CHOICE_MESSAGE: &str =
    "Выберите корректный вариант. Вашего варианта нет среди допустимых значений.";
pub const INVALID_IMAGE_MESSAGE: &str = "Загрузите правильное изображение. Файл, который вы загрузили, поврежден или не является изображением.";

const EMPTY_CHOICE_LABEL: &str = "---------";

/// Per-field error messages, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = match error.code.as_ref() {
                    // `length(min = 1)` on trimmed text is the required check
                    "length" | "required" => REQUIRED_MESSAGE.to_string(),
                    code => error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| code.to_string()),
                };
                form_errors.add(&field.to_string(), message);
            }
        }
        form_errors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Char,
    Choice,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    pub errors: Vec<String>,
}

/// A form as handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub fields: Vec<FormField>,
}

impl FormView {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// A file part of a multipart submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Whether the bytes decode as a raster image. A recognised header
    /// over a truncated or corrupt body does not count.
    pub fn is_image(&self) -> bool {
        match image::load_from_memory(&self.data) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(filename = %self.filename, error = %e, "upload is not a decodable image");
                false
            }
        }
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct PostForm {
    #[validate(length(min = 1))]
    pub text: String,
    /// Raw group id from the select box; empty means no group
    pub group: Option<String>,
    pub image: Option<UploadedFile>,
    /// "Clear" checkbox next to an existing image
    pub image_clear: bool,
    /// Image already attached to the post being edited
    pub current_image: Option<String>,
}

/// Post fields that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<UploadedFile>,
    pub clear_image: bool,
}

impl PostForm {
    pub const TEXT_LABEL: &'static str = "Описание поста";
    pub const GROUP_LABEL: &'static str = "Отношение к группе";
    pub const IMAGE_LABEL: &'static str = "Картинка";

    pub fn new(text: &str, group: Option<String>, image: Option<UploadedFile>) -> Self {
        Self {
            text: text.trim().to_string(),
            group: group.filter(|g| !g.trim().is_empty()),
            image: image.filter(|file| !file.data.is_empty()),
            image_clear: false,
            current_image: None,
        }
    }

    /// Form pre-filled from an existing post
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
            image: None,
            image_clear: false,
            current_image: post.image.clone(),
        }
    }

    pub fn clean(&self, groups: &[Group]) -> Result<CleanedPost, FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };

        let group_id = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) if groups.iter().any(|group| group.id == id) => Some(id),
                _ => {
                    errors.add("group", INVALID_CHOICE_MESSAGE);
                    None
                }
            },
        };

        if let Some(image) = &self.image {
            if !image.is_image() {
                errors.add("image", INVALID_IMAGE_MESSAGE);
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CleanedPost {
            text: self.text.clone(),
            group_id,
            image: self.image.clone(),
            clear_image: self.image_clear && self.image.is_none(),
        })
    }

    pub fn render(&self, groups: &[Group], errors: &FormErrors) -> FormView {
        let mut choices = vec![Choice {
            value: String::new(),
            label: EMPTY_CHOICE_LABEL.to_string(),
        }];
        choices.extend(groups.iter().map(|group| Choice {
            value: group.id.to_string(),
            label: group.title.clone(),
        }));

        FormView {
            fields: vec![
                FormField {
                    name: "text",
                    label: Self::TEXT_LABEL,
                    kind: FieldKind::Char,
                    required: true,
                    value: Some(self.text.clone()),
                    choices: Vec::new(),
                    errors: errors.field("text").to_vec(),
                },
                FormField {
                    name: "group",
                    label: Self::GROUP_LABEL,
                    kind: FieldKind::Choice,
                    required: false,
                    value: self.group.clone(),
                    choices,
                    errors: errors.field("group").to_vec(),
                },
                FormField {
                    name: "image",
                    label: Self::IMAGE_LABEL,
                    kind: FieldKind::Image,
                    required: false,
                    value: self.current_image.clone(),
                    choices: Vec::new(),
                    errors: errors.field("image").to_vec(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct CommentForm {
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedComment {
    pub text: String,
}

impl CommentForm {
    pub const TEXT_LABEL: &'static str = "Добавить комментарий";

    pub fn new(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
        }
    }

    pub fn clean(&self) -> Result<CleanedComment, FormErrors> {
        self.validate().map_err(FormErrors::from)?;
        Ok(CleanedComment {
            text: self.text.clone(),
        })
    }

    pub fn render(&self, errors: &FormErrors) -> FormView {
        FormView {
            fields: vec![FormField {
                name: "text",
                label: Self::TEXT_LABEL,
                kind: FieldKind::Char,
                required: true,
                value: Some(self.text.clone()),
                choices: Vec::new(),
                errors: errors.field("text").to_vec(),
            }],
        }
    }
}

/// 2x1 GIF
#[cfg(test)]
pub(crate) const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![Group {
            id: 7,
            title: "Тестовый заголовок".into(),
            slug: "test-slug".into(),
            description: "Тестовое описание".into(),
        }]
    }

    fn gif() -> UploadedFile {
        UploadedFile {
            filename: "small.gif".into(),
            content_type: Some("image/gif".into()),
            data: SMALL_GIF.to_vec(),
        }
    }

    #[test]
    fn test_valid_post_form() {
        let form = PostForm::new("  Текст  ", Some("7".into()), Some(gif()));
        let cleaned = form.clean(&groups()).unwrap();

        assert_eq!(cleaned.text, "Текст");
        assert_eq!(cleaned.group_id, Some(7));
        assert!(cleaned.image.is_some());
    }

    #[test]
    fn test_empty_text_is_required() {
        let errors = PostForm::new("   ", None, None).clean(&groups()).unwrap_err();
        assert_eq!(errors.field("text"), [REQUIRED_MESSAGE.to_string()]);
        assert!(errors.field("group").is_empty());
    }

    #[test]
    fn test_unknown_group_is_invalid_choice() {
        for raw in ["999", "not-a-number"] {
            let errors = PostForm::new("Текст", Some(raw.into()), None)
                .clean(&groups())
                .unwrap_err();
            assert_eq!(errors.field("group"), [INVALID_CHOICE_MESSAGE.to_string()]);
        }
    }

    #[test]
    fn test_blank_group_means_none() {
        let cleaned = PostForm::new("Текст", Some("".into()), None)
            .clean(&groups())
            .unwrap();
        assert_eq!(cleaned.group_id, None);
    }

    #[test]
    fn test_non_image_upload_is_rejected() {
        let file = UploadedFile {
            filename: "notes.txt".into(),
            content_type: Some("text/plain".into()),
            data: b"just some text".to_vec(),
        };
        let errors = PostForm::new("Текст", None, Some(file))
            .clean(&groups())
            .unwrap_err();
        assert_eq!(errors.field("image"), [INVALID_IMAGE_MESSAGE.to_string()]);
    }

    #[test]
    fn test_corrupt_image_is_rejected() {
        let truncated = UploadedFile {
            data: SMALL_GIF[..SMALL_GIF.len() - 8].to_vec(),
            ..gif()
        };
        let garbage = UploadedFile {
            data: b"GIF89a this is not really an image".to_vec(),
            ..gif()
        };

        for file in [truncated, garbage] {
            let errors = PostForm::new("Текст", None, Some(file))
                .clean(&groups())
                .unwrap_err();
            assert_eq!(errors.field("image"), [INVALID_IMAGE_MESSAGE.to_string()]);
        }
    }

    #[test]
    fn test_required_message_comes_from_constant() {
        let errors = CommentForm::new("").validate().unwrap_err();
        assert_eq!(
            FormErrors::from(errors).field("text"),
            [REQUIRED_MESSAGE.to_string()]
        );
    }

    #[test]
    fn test_empty_upload_is_no_image() {
        let file = UploadedFile {
            filename: "".into(),
            content_type: None,
            data: Vec::new(),
        };
        let cleaned = PostForm::new("Текст", None, Some(file))
            .clean(&groups())
            .unwrap();
        assert!(cleaned.image.is_none());
    }

    #[test]
    fn test_post_form_field_kinds() {
        let view = PostForm::default().render(&groups(), &FormErrors::new());

        assert_eq!(view.field("text").unwrap().kind, FieldKind::Char);
        assert_eq!(view.field("group").unwrap().kind, FieldKind::Choice);
        assert_eq!(view.field("image").unwrap().kind, FieldKind::Image);
        assert_eq!(view.field("text").unwrap().label, "Описание поста");
        assert_eq!(view.field("group").unwrap().label, "Отношение к группе");
        // empty choice plus one group
        assert_eq!(view.field("group").unwrap().choices.len(), 2);
    }

    #[test]
    fn test_render_keeps_errors_and_values() {
        let form = PostForm::new("", Some("999".into()), None);
        let errors = form.clean(&groups()).unwrap_err();
        let view = form.render(&groups(), &errors);

        assert_eq!(view.field("text").unwrap().errors, [REQUIRED_MESSAGE.to_string()]);
        assert_eq!(view.field("group").unwrap().value.as_deref(), Some("999"));
    }

    #[test]
    fn test_comment_form() {
        assert_eq!(
            CommentForm::new(" Отлично ").clean().unwrap().text,
            "Отлично"
        );

        let errors = CommentForm::new("").clean().unwrap_err();
        assert_eq!(errors.field("text"), [REQUIRED_MESSAGE.to_string()]);

        let view = CommentForm::default().render(&FormErrors::new());
        assert_eq!(view.field("text").unwrap().label, "Добавить комментарий");
    }
}
