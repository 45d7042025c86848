//! PDF report generation via `printpdf`.

use std::io::BufWriter;

use eyescan_llm::ImagePayload;
use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::*;

use super::{condition_title, recommendation, RenderError, RenderResult, Report};
use super::{NO_DISEASE_ADVICE, NO_DISEASE_HEADING, UNSUPPORTED_MESSAGE};
use crate::models::{Catalog, Diagnosis};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const TOP: f32 = 280.0;
/// Printed width of the embedded eye image
pub const IMAGE_WIDTH_MM: f32 = 100.0;
const IMAGE_DPI: f32 = 300.0;

/// Cursor over the current page that starts a new page when it runs out.
struct PageWriter<'d> {
    doc: &'d PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl<'d> PageWriter<'d> {
    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
            self.pages += 1;
        }
    }

    fn heading(&mut self, text: &str, size: f32) {
        self.ensure_space(8.0);
        self.layer.use_text(text, size, Mm(MARGIN), Mm(self.y), &self.bold);
        self.y -= 8.0;
    }

    fn line(&mut self, text: &str) {
        for line in wrap_text(text, 90) {
            self.ensure_space(5.5);
            self.layer.use_text(&line, 10.0, Mm(MARGIN), Mm(self.y), &self.font);
            self.y -= 5.5;
        }
    }

    fn small(&mut self, text: &str) {
        self.ensure_space(4.0);
        self.layer.use_text(text, 7.0, Mm(MARGIN), Mm(self.y), &self.font);
        self.y -= 4.0;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn image(&mut self, image: &DynamicImage) {
        let (width_px, height_px) = image.dimensions();
        let natural_width = width_px as f32 / IMAGE_DPI * 25.4;
        let natural_height = height_px as f32 / IMAGE_DPI * 25.4;

        let mut scale = IMAGE_WIDTH_MM / natural_width;
        let max_height = TOP - MARGIN;
        if natural_height * scale > max_height {
            scale = max_height / natural_height;
        }
        let printed_height = natural_height * scale;

        self.ensure_space(printed_height);
        self.y -= printed_height;
        Image::from_dynamic_image(image).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(self.y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        self.y -= 6.0;
    }
}

/// Render a report as PDF bytes.
///
/// The image, when given, is decoded and re-embedded; a decode failure is
/// an error rather than a report without the image.
pub fn render_pdf(
    report: &Report,
    catalog: &Catalog,
    image: Option<&ImagePayload>,
) -> RenderResult<Vec<u8>> {
    let decoded = image.map(decode_image).transpose()?;

    let title = "Eye Disease Detection Medical Report";
    let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Pdf(format!("font error: {e}")))?;

    let mut page = PageWriter {
        doc: &doc,
        layer,
        font,
        bold,
        y: TOP,
        pages: 1,
    };

    page.heading(title, 16.0);
    page.gap(4.0);

    // Patient information
    let patient = &report.patient;
    page.heading("Patient Information", 12.0);
    page.line(&format!("Name: {}", patient.name()));
    page.line(&format!("Age: {}", patient.age()));
    page.line(&format!("Gender: {}", patient.gender().label()));
    page.line(&format!("Location: {}", patient.location()));
    page.line(&format!("Symptoms: {}", patient.symptom_summary()));
    page.line(&format!("Additional Factors: {}", patient.factor_summary()));
    for (label, value) in patient.history().lines() {
        page.line(&format!("{label}: {value}"));
    }
    page.gap(4.0);

    // Diagnosis
    page.heading("Diagnosis Details", 12.0);
    match &report.diagnosis {
        Diagnosis::Diagnosed { disease, .. } => {
            let entry = catalog
                .lookup(disease)
                .ok_or_else(|| RenderError::UnknownDisease(disease.clone()))?;
            page.line(&condition_title(&entry.key));
            page.gap(2.0);
            page.heading("Key Symptoms:", 11.0);
            for symptom in &entry.symptoms {
                page.line(&format!("- {symptom}"));
            }
            page.gap(2.0);
            page.heading("Recommended Precautions:", 11.0);
            for precaution in &entry.precautions {
                page.line(&format!("- {precaution}"));
            }
            page.gap(2.0);
            page.heading("Medical Recommendation:", 11.0);
            page.line(&recommendation(&entry.key));
        }
        Diagnosis::Healthy { .. } => {
            page.line(NO_DISEASE_HEADING);
            page.line(NO_DISEASE_ADVICE);
        }
        Diagnosis::Unsupported => page.line(UNSUPPORTED_MESSAGE),
        Diagnosis::ClassificationFailed { reason }
        | Diagnosis::InputInvalid { reason }
        | Diagnosis::ReportFailed { reason } => {
            page.line("No diagnosis was made.");
            page.line(reason);
        }
    }
    page.gap(4.0);

    if let Some(image) = &decoded {
        page.heading("Uploaded Image", 12.0);
        page.image(image);
    }

    // Footer
    page.small(&format!("Report ID: {}", report.id));
    page.small(&format!("Generated: {}", report.generated_at));
    if let Some(digest) = &report.image_sha256 {
        page.small(&format!("Image SHA-256: {digest}"));
    }

    tracing::debug!(report_id = %report.id, pages = page.pages, "PDF rendered");
    drop(page);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| RenderError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| RenderError::Pdf(format!("buffer error: {e}")))
}

fn decode_image(payload: &ImagePayload) -> RenderResult<DynamicImage> {
    let image = image_crate::load_from_memory(payload.data())
        .map_err(|e| RenderError::ImageEmbed(e.to_string()))?;
    // Alpha is dropped; PDF image XObjects here are plain RGB
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
