use super::{Reversible, Touch};
use crate::layout::TextLayout;
use crate::model::{Annotation, AnnotationStyle, Point};
use crate::state::EditorState;

#[derive(Clone, Debug)]
pub struct AddAnnotation {
    pub annotation: Annotation,
    text_layout: Option<TextLayout>,
    applied: bool,
    touch: Touch,
}

impl AddAnnotation {
    pub fn new(annotation: Annotation) -> Self {
        AddAnnotation { annotation, text_layout: None, applied: false, touch: Touch::default() }
    }
}

impl Reversible for AddAnnotation {
    fn execute(&mut self, state: &mut EditorState) {
        if state.genogram.annotations.contains_key(&self.annotation.id) {
            return;
        }
        let center = self.annotation.layout.center;
        let text = self
            .text_layout
            .get_or_insert_with(|| TextLayout::at(center, state.layout.next_z_index()))
            .clone();
        state.genogram.annotations.insert(self.annotation.id.clone(), self.annotation.clone());
        state.layout.texts.insert(self.annotation.id.clone(), text);
        self.touch.apply(state);
        self.applied = true;
    }

    fn undo(&mut self, state: &mut EditorState) {
        if !self.applied {
            return;
        }
        state.genogram.annotations.remove(&self.annotation.id);
        state.layout.texts.remove(&self.annotation.id);
        self.touch.revert(state);
        self.applied = false;
    }

    fn description(&self) -> &'static str {
        "add annotation"
    }
}

#[derive(Clone, Debug)]
pub struct DeleteAnnotation {
    pub id: String,
    backup: Option<(Annotation, Option<TextLayout>)>,
    touch: Touch,
}

impl DeleteAnnotation {
    pub fn new(id: impl Into<String>) -> Self {
        DeleteAnnotation { id: id.into(), backup: None, touch: Touch::default() }
    }
}

impl Reversible for DeleteAnnotation {
    fn execute(&mut self, state: &mut EditorState) {
        let Some(current) = state.genogram.annotations.remove(&self.id) else {
            return;
        };
        let text = state.layout.texts.remove(&self.id);
        if self.backup.is_none() {
            self.backup = Some((current, text));
        }
        self.touch.apply(state);
    }

    fn undo(&mut self, state: &mut EditorState) {
        let Some((annotation, text)) = &self.backup else {
            return;
        };
        if state.genogram.annotations.contains_key(&self.id) {
            return;
        }
        state.genogram.annotations.insert(self.id.clone(), annotation.clone());
        if let Some(text) = text {
            state.layout.texts.insert(self.id.clone(), text.clone());
        }
        self.touch.revert(state);
    }

    fn description(&self) -> &'static str {
        "delete annotation"
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationUpdate {
    pub text: Option<String>,
    pub style: Option<AnnotationStyle>,
}

impl AnnotationUpdate {
    pub fn text(text: impl Into<String>) -> Self {
        AnnotationUpdate { text: Some(text.into()), style: None }
    }

    fn then(self, next: AnnotationUpdate) -> AnnotationUpdate {
        AnnotationUpdate { text: next.text.or(self.text), style: next.style.or(self.style) }
    }
}

#[derive(Clone, Debug)]
pub struct UpdateAnnotation {
    pub id: String,
    pub update: AnnotationUpdate,
    previous: Option<Annotation>,
    touch: Touch,
}

impl UpdateAnnotation {
    pub fn new(id: impl Into<String>, update: AnnotationUpdate) -> Self {
        UpdateAnnotation { id: id.into(), update, previous: None, touch: Touch::default() }
    }

    pub(crate) fn merge(self, next: UpdateAnnotation) -> UpdateAnnotation {
        UpdateAnnotation {
            id: self.id,
            update: self.update.then(next.update),
            previous: self.previous,
            touch: self.touch,
        }
    }
}

impl Reversible for UpdateAnnotation {
    fn execute(&mut self, state: &mut EditorState) {
        let Some(annotation) = state.genogram.annotations.get_mut(&self.id) else {
            return;
        };
        if self.previous.is_none() {
            self.previous = Some(annotation.clone());
        }
        if let Some(text) = &self.update.text {
            annotation.text = text.clone();
        }
        if let Some(style) = &self.update.style {
            annotation.layout.style = style.clone();
        }
        self.touch.apply(state);
    }

    fn undo(&mut self, state: &mut EditorState) {
        let Some(prev) = &self.previous else {
            return;
        };
        if let Some(annotation) = state.genogram.annotations.get_mut(&self.id) {
            *annotation = prev.clone();
            self.touch.revert(state);
        }
    }

    fn description(&self) -> &'static str {
        "update annotation"
    }
}

#[derive(Clone, Debug)]
pub struct MoveAnnotation {
    pub id: String,
    pub to: Point,
    from: Option<Point>,
    touch: Touch,
}

impl MoveAnnotation {
    pub fn new(id: impl Into<String>, to: Point) -> Self {
        MoveAnnotation { id: id.into(), to, from: None, touch: Touch::default() }
    }

    pub(crate) fn merge(self, next: MoveAnnotation) -> MoveAnnotation {
        MoveAnnotation { id: self.id, to: next.to, from: self.from, touch: self.touch }
    }
}

fn place_annotation(state: &mut EditorState, id: &str, p: Point) {
    if let Some(a) = state.genogram.annotations.get_mut(id) {
        a.layout.center = p;
    }
    if let Some(t) = state.layout.texts.get_mut(id) {
        t.position = p;
    }
}

impl Reversible for MoveAnnotation {
    fn execute(&mut self, state: &mut EditorState) {
        let Some(a) = state.genogram.annotations.get(&self.id) else {
            return;
        };
        if self.from.is_none() {
            self.from = Some(a.layout.center);
        }
        place_annotation(state, &self.id, self.to);
        self.touch.apply(state);
    }

    fn undo(&mut self, state: &mut EditorState) {
        let Some(from) = self.from else {
            return;
        };
        if state.genogram.annotations.contains_key(&self.id) {
            place_annotation(state, &self.id, from);
            self.touch.revert(state);
        }
    }

    fn description(&self) -> &'static str {
        "move annotation"
    }
}
