use std::sync::LazyLock;

use log::debug;

use crate::data::{Dtype, ParamValue, Wtype};
use crate::header::{HeaderSource, ObsHeader};
use crate::parameter::Parameter;
use crate::parameters::Parameters;
use crate::registry::{ParameterRegistry, StepDefaults};

/// Default parameters for every step of the FIFI-LS reduction, in the
/// order the pipeline runs them. Built on first use; the table itself
/// is never mutated, runtime copies are made per step through
/// [`Parameters::add_current_parameters`].
pub static FIFI_LS_DEFAULTS: LazyLock<ParameterRegistry> = LazyLock::new(default_parameters);

// every step saves its products through the same switch
fn save_output(value: bool) -> Parameter {
    Parameter {
        key: "save".to_string(),
        name: "Save output".to_string(),
        value: ParamValue::Bool(value),
        description: "Save output data to disk".to_string(),
        dtype: Dtype::Bool,
        wtype: Wtype::CheckBox,
        ..Default::default()
    }
}

// hidden for steps that do not split their work across files
fn parallel(value: bool, hidden: bool) -> Parameter {
    Parameter {
        key: "parallel".to_string(),
        name: "Use parallel processing".to_string(),
        value: ParamValue::Bool(value),
        description: "If set, processing will be distributed across multiple cores.".to_string(),
        dtype: Dtype::Bool,
        wtype: Wtype::CheckBox,
        hidden,
        ..Default::default()
    }
}

fn default_parameters() -> ParameterRegistry {
    let mut registry = ParameterRegistry::default();

    //header validation
    registry.add(StepDefaults {
        name: "checkhead".to_string(),
        parameters: vec![Parameter {
            key: "abort".to_string(),
            name: "Abort reduction for invalid headers".to_string(),
            value: ParamValue::Bool(true),
            description: "If set, the reduction will be aborted if the input headers do not meet requirements".to_string(),
            dtype: Dtype::Bool,
            wtype: Wtype::CheckBox,
            ..Default::default()
        }],
    });
    // split into independent grating positions and chop phases
    registry.add(StepDefaults {
        name: "split_grating_and_chop".to_string(),
        parameters: vec![save_output(false), parallel(false, true)],
    });
    // ramp fitting
    registry.add(StepDefaults {
        name: "fit_ramps".to_string(),
        parameters: vec![
            save_output(false),
            parallel(true, false),
            Parameter {
                key: "s2n".to_string(),
                name: "Signal-to-noise threshold".to_string(),
                value: ParamValue::Float(10.0),
                description: "S/N threshold for data rejection. Set to -1 to turn off filtering."
                    .to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "thresh".to_string(),
                name: "Combination threshold (sigma)".to_string(),
                value: ParamValue::Float(5.0),
                description: "Threshold for ramp fit rejection.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "badpix_file".to_string(),
                name: "Bad pixel file".to_string(),
                value: ParamValue::Str("".to_string()),
                description: "Text file containing bad pixel locations".to_string(),
                dtype: Dtype::Str,
                wtype: Wtype::PickFile,
                ..Default::default()
            },
            Parameter {
                key: "remove_first".to_string(),
                name: "Remove 1st 2 ramps".to_string(),
                value: ParamValue::Bool(true),
                description: "If set, the first two ramps will be removed before fitting."
                    .to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "subtract_bias".to_string(),
                name: "Subtract bias".to_string(),
                value: ParamValue::Bool(true),
                description: "If set, the value from the open zeroth spexel will be subtracted before fitting.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "indpos_sigma".to_string(),
                name: "Threshold for grating instability".to_string(),
                value: ParamValue::Float(3.0),
                description: "Threshold in sigma for allowed ramp-averaged deviation from expected grating position. \nSet to -1 to turn off filtering.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
        ],
    });
    // chop subtraction
    registry.add(StepDefaults {
        name: "subtract_chops".to_string(),
        parameters: vec![save_output(false), parallel(false, true)],
    });
    // nod combination
    registry.add(StepDefaults {
        name: "combine_nods".to_string(),
        parameters: vec![
            save_output(false),
            Parameter {
                key: "b_nod_method".to_string(),
                name: "Method for combining off-beam images".to_string(),
                description: "For C2NC2 only: nearest takes closest B in time,\naverage will mean-combine before and after B nods,\ninterpolate will linearly interpolate before and\nafter B nods to the A nod time.".to_string(),
                wtype: Wtype::ComboBox,
                options: vec![
                    "nearest".to_string(),
                    "average".to_string(),
                    "interpolate".to_string(),
                ],
                option_index: Some(0),
                ..Default::default()
            },
            Parameter {
                key: "offbeam".to_string(),
                name: "Propagate off-beam image instead of on-beam".to_string(),
                value: ParamValue::Bool(false),
                description: "Select to propagate B nods, or to subtract A from B.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
        ],
    });
    // wavelength calibration
    registry.add(StepDefaults {
        name: "lambda_calibrate".to_string(),
        parameters: vec![save_output(false), parallel(false, true)],
    });
    // spatial calibration
    registry.add(StepDefaults {
        name: "spatial_calibrate".to_string(),
        parameters: vec![
            save_output(false),
            parallel(false, true),
            Parameter {
                key: "rotate".to_string(),
                name: "Rotate by detector angle".to_string(),
                value: ParamValue::Bool(true),
                description: "If set, output grid is rotated to North up.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "flipsign".to_string(),
                name: "Flip RA/DEC sign convention".to_string(),
                description: "Default will determine correct setting from the observation date."
                    .to_string(),
                wtype: Wtype::RadioButton,
                options: vec![
                    "flip".to_string(),
                    "no flip".to_string(),
                    "default".to_string(),
                ],
                option_index: Some(2),
                ..Default::default()
            },
        ],
    });
    // flat correction
    registry.add(StepDefaults {
        name: "apply_static_flat".to_string(),
        parameters: vec![
            save_output(false),
            parallel(false, true),
            Parameter {
                key: "skip_flat".to_string(),
                name: "Skip flat correction".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, data will not be flat corrected.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "skip_err".to_string(),
                name: "Skip flat error propagation".to_string(),
                value: ParamValue::Bool(true),
                description: "If set, flat errors will not be propagated.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
        ],
    });
    // grating scan combination
    registry.add(StepDefaults {
        name: "combine_grating_scans".to_string(),
        parameters: vec![
            save_output(true),
            parallel(false, true),
            Parameter {
                key: "bias".to_string(),
                name: "Correct bias offset".to_string(),
                value: ParamValue::Bool(true),
                description: "If set, an additive offset between overlapping scans will be removed.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
        ],
    });
    // telluric correction
    registry.add(StepDefaults {
        name: "telluric_correct".to_string(),
        parameters: vec![
            save_output(false),
            parallel(false, true),
            Parameter {
                key: "skip_tell".to_string(),
                name: "Skip telluric correction".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, data will not be telluric corrected.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "atran_dir".to_string(),
                name: "ATRAN directory".to_string(),
                value: ParamValue::Str("".to_string()),
                description: "Override default set of ATRAN FITS files".to_string(),
                dtype: Dtype::Str,
                wtype: Wtype::PickDirectory,
                ..Default::default()
            },
            Parameter {
                key: "cutoff".to_string(),
                name: "Cutoff value".to_string(),
                value: ParamValue::Float(0.6),
                description: "Below this value in fractional transmission, flux values are set to NaN.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "use_wv".to_string(),
                name: "Use WV values".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, water vapor values from the header will be used to choose the correct ATRAN file.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
        ],
    });
    // flux calibration
    registry.add(StepDefaults {
        name: "flux_calibrate".to_string(),
        parameters: vec![
            save_output(true),
            parallel(false, true),
            Parameter {
                key: "skip_cal".to_string(),
                name: "Skip flux calibration".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, data will not be calibrated.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "response_file".to_string(),
                name: "Response file (.fits)".to_string(),
                value: ParamValue::Str("".to_string()),
                description: "Override default response file".to_string(),
                dtype: Dtype::Str,
                wtype: Wtype::PickFile,
                ..Default::default()
            },
        ],
    });
    // wavelength shift correction
    registry.add(StepDefaults {
        name: "correct_wave_shift".to_string(),
        parameters: vec![
            save_output(false),
            parallel(false, true),
            Parameter {
                key: "skip_shift".to_string(),
                name: "Skip wavelength shift correction".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, wavelengths will not be corrected.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
        ],
    });
    // resampling onto the regular output grid
    registry.add(StepDefaults {
        name: "resample".to_string(),
        parameters: vec![
            Parameter {
                key: "general_params".to_string(),
                name: "General Parameters".to_string(),
                wtype: Wtype::Group,
                ..Default::default()
            },
            save_output(true),
            parallel(true, false),
            Parameter {
                key: "max_cores".to_string(),
                name: "Maximum cores to use".to_string(),
                description: "Set to the maximum number of cores to use in \nparallel processing. If not set, 1/2 of available \ncores will be used.".to_string(),
                dtype: Dtype::Int,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "check_memory".to_string(),
                name: "Check memory use during resampling".to_string(),
                value: ParamValue::Bool(true),
                description: "Set to manage memory use and abort if more \nmemory is needed than is available. \nTurn off to attempt processing anyway.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "skip_coadd".to_string(),
                name: "Skip coadd".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, separate cubes will be made for each input file."
                    .to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "interpolate".to_string(),
                name: "Interpolate instead of fit".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, cubes are separately interpolated, then mean-combined. Not recommended for dithered data.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "error_weighting".to_string(),
                name: "Weight by errors".to_string(),
                value: ParamValue::Bool(true),
                description: "If set, flux fits are inversely weighted by the error values."
                    .to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "fitthresh".to_string(),
                name: "Fit rejection threshold (sigma)".to_string(),
                value: ParamValue::Float(-1.0),
                description: "Set higher to keep more fit values.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "posthresh".to_string(),
                name: "Positive outlier threshold (sigma)".to_string(),
                value: ParamValue::Float(-1.0),
                description: "Set higher to keep more positive data.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "negthresh".to_string(),
                name: "Negative outlier threshold (sigma)".to_string(),
                value: ParamValue::Float(-1.0),
                description: "Set higher to keep more negative data. Set to 0 to turn off initial rejection pass.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "append_weights".to_string(),
                name: "Append distance weights to output file".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, distance weights calculated by the resampling algorithm will be appended to the output FITS file.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "skip_uncorrected".to_string(),
                name: "Skip computing the uncorrected flux cube".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, the uncorrected flux data will be ignored.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "otf_params".to_string(),
                name: "Scan Resampling Parameters".to_string(),
                wtype: Wtype::Group,
                ..Default::default()
            },
            Parameter {
                key: "scan_reduction".to_string(),
                name: "Use scan reduction before resample".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, a scan reduction will be performed to remove additional gains and background before resampling.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "save_scan".to_string(),
                name: "Save intermediate scan product".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, the scan product will be saved to disk as a FITS file."
                    .to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "scan_options".to_string(),
                name: "Scan options".to_string(),
                value: ParamValue::Str("".to_string()),
                description: "Parameters to pass to the scan reduction. \nEnter as key=value pairs, space-separated.".to_string(),
                dtype: Dtype::Str,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "spatial_params".to_string(),
                name: "Spatial Resampling Parameters".to_string(),
                wtype: Wtype::Group,
                ..Default::default()
            },
            Parameter {
                key: "detector_coordinates".to_string(),
                name: "Create map in detector coordinates".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, data are combined in arsecond offsets from center, rather than sky coordinates. \nIf not set, detector coordinates are used for nonsidereal targets and sky coordinates otherwise.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "xy_oversample".to_string(),
                name: "Spatial oversample (pixels per mean FWHM)".to_string(),
                value: ParamValue::Float(5.0),
                description: "Set higher to oversample more.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "xy_pixel_size".to_string(),
                name: "Output spatial pixel size (arcsec)".to_string(),
                description: "If set, will override oversample parameter.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "xy_order".to_string(),
                name: "Spatial surface fit order".to_string(),
                value: ParamValue::Int(2),
                description: "Set lower for more stable fits.".to_string(),
                dtype: Dtype::Int,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "xy_window".to_string(),
                name: "Spatial fit window (factor times FWHM)".to_string(),
                value: ParamValue::Float(3.0),
                description: "Set higher to fit more pixels.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "xy_smoothing".to_string(),
                name: "Spatial smoothing radius (factor times FWHM)".to_string(),
                value: ParamValue::Float(1.0),
                description: "Set higher to smooth over more pixels.\nSet to 0 to turn off distance weights.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "xy_edge_threshold".to_string(),
                name: "Spatial edge threshold (0-1)".to_string(),
                value: ParamValue::Float(0.7),
                description: "Set higher to set more edge pixels to NaN.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "adaptive_algorithm".to_string(),
                name: "Adaptive smoothing algorithm".to_string(),
                description: "If scaled, only the size is allowed to vary.\nIf shaped, the kernel shape and rotation may \nalso vary. If none, the kernel will not vary.".to_string(),
                wtype: Wtype::ComboBox,
                options: vec![
                    "scaled".to_string(),
                    "shaped".to_string(),
                    "none".to_string(),
                ],
                option_index: Some(2),
                ..Default::default()
            },
            Parameter {
                key: "spec_params".to_string(),
                name: "Spectral Resampling Parameters".to_string(),
                wtype: Wtype::Group,
                ..Default::default()
            },
            Parameter {
                key: "w_oversample".to_string(),
                name: "Spectral oversample (pixels per mean FWHM)".to_string(),
                value: ParamValue::Float(8.0),
                description: "Set higher to oversample more.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "w_pixel_size".to_string(),
                name: "Output spectral pixel size (um)".to_string(),
                description: "If set, will override oversample parameter.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "w_order".to_string(),
                name: "Spectral surface fit order".to_string(),
                value: ParamValue::Int(2),
                description: "Set lower for more stable fits.".to_string(),
                dtype: Dtype::Int,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "w_window".to_string(),
                name: "Spectral fit window (factor times FWHM)".to_string(),
                value: ParamValue::Float(0.50),
                description: "Set higher to fit more pixels.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "w_smoothing".to_string(),
                name: "Spectral smoothing radius (factor times FWHM)".to_string(),
                value: ParamValue::Float(0.25),
                description: "Set higher to smooth over more pixels.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "w_edge_threshold".to_string(),
                name: "Spectral edge threshold (0-1)".to_string(),
                value: ParamValue::Float(0.5),
                description: "Set higher to set more edge pixels to NaN.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
        ],
    });
    // preview image generation
    registry.add(StepDefaults {
        name: "specmap".to_string(),
        parameters: vec![
            Parameter {
                key: "skip_preview".to_string(),
                name: "Skip making the preview image".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, the preview image will not be generated.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "extension".to_string(),
                name: "Extension to map".to_string(),
                value: ParamValue::Str("FLUX".to_string()),
                description: "Usually FLUX, but UNCORRECTED_FLUX is sometimes better.".to_string(),
                dtype: Dtype::Str,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "slice_method".to_string(),
                name: "Method for selecting spectral slice".to_string(),
                description: "The display image will be selected from the cube either at the reference wavelength \n(G_WAVE_B/R) or at the peak signal-to-noise point in the cube.".to_string(),
                wtype: Wtype::ComboBox,
                options: vec!["reference".to_string(), "peak".to_string()],
                option_index: Some(0),
                ..Default::default()
            },
            Parameter {
                key: "point_method".to_string(),
                name: "Method for selecting spatial point".to_string(),
                description: "The display spectrum will be selected from the cube either at the reference position \n(OBSLAM/BET) or at the peak flux in the selected spectral slice.".to_string(),
                wtype: Wtype::ComboBox,
                options: vec!["reference".to_string(), "peak".to_string()],
                option_index: Some(1),
                ..Default::default()
            },
            Parameter {
                key: "override_slice".to_string(),
                name: "Override wavelength slice".to_string(),
                value: ParamValue::Str("".to_string()),
                description: "Manually specify the wavelength slice (zero-indexed) for the image.".to_string(),
                dtype: Dtype::Str,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "override_point".to_string(),
                name: "Override spatial point".to_string(),
                value: ParamValue::Str("".to_string()),
                description: "Manually specify the spatial index for the spectrum, as 'x,y', zero-indexed.".to_string(),
                dtype: Dtype::Str,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "ignore_outer".to_string(),
                name: "Fraction of outer wavelengths to ignore".to_string(),
                value: ParamValue::Float(0.2),
                description: "Used with method = peak. Set to 0 to include all wavelengths in calculating signal peak.".to_string(),
                dtype: Dtype::Float,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "colormap".to_string(),
                name: "Color map".to_string(),
                value: ParamValue::Str("plasma".to_string()),
                description: "Matplotlib color map name.".to_string(),
                dtype: Dtype::Str,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "scale".to_string(),
                name: "Flux scale for image".to_string(),
                value: ParamValue::FloatList(vec![0.25, 99.9]),
                description: "Specify a low and high percentile value for the image scale, e.g. [0,99].".to_string(),
                dtype: Dtype::FloatList,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "n_contour".to_string(),
                name: "Number of contours".to_string(),
                value: ParamValue::Int(0),
                description: "Set to 0 to turn off countours.".to_string(),
                dtype: Dtype::Int,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "contour_color".to_string(),
                name: "Contour color".to_string(),
                value: ParamValue::Str("gray".to_string()),
                description: "Matplotlib color name.".to_string(),
                dtype: Dtype::Str,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "fill_contours".to_string(),
                name: "Filled contours".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, contours will be filled instead of overlaid.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "grid".to_string(),
                name: "Overlay grid".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, a coordinate grid will be overlaid on the image."
                    .to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "beam".to_string(),
                name: "Beam marker".to_string(),
                value: ParamValue::Bool(false),
                description: "If set, a beam marker will be added to the image.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "atran_plot".to_string(),
                name: "Overplot transmission".to_string(),
                value: ParamValue::Bool(true),
                description: "If set, the atmospheric transmission spectrum will\n be displayed in the spectral plot.".to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "error_plot".to_string(),
                name: "Overplot error range".to_string(),
                value: ParamValue::Bool(true),
                description: "If set, the error range will\n be overlaid on the spectral plot."
                    .to_string(),
                dtype: Dtype::Bool,
                wtype: Wtype::CheckBox,
                ..Default::default()
            },
            Parameter {
                key: "spec_scale".to_string(),
                name: "Flux scale for spectral plot".to_string(),
                value: ParamValue::FloatList(vec![0.0, 100.0]),
                description: "Specify a low and high percentile value for the spectral flux scale, e.g. [0,99].".to_string(),
                dtype: Dtype::FloatList,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
            Parameter {
                key: "watermark".to_string(),
                name: "Watermark text".to_string(),
                value: ParamValue::Str("".to_string()),
                description: "Text to add to image as a watermark.".to_string(),
                dtype: Dtype::Str,
                wtype: Wtype::TextBox,
                ..Default::default()
            },
        ],
    });

    registry
}

/// Reduction parameters for the FIFI-LS pipeline. Carries an optional
/// observation header used to adjust step defaults for the instrument
/// configuration.
#[derive(Clone, Debug)]
pub struct FifiLsParameters<H: HeaderSource = ObsHeader> {
    parameters: Parameters,
    basehead: Option<H>,
}

impl FifiLsParameters {
    /// Library defaults with no observation header.
    pub fn new() -> Self {
        FifiLsParameters {
            parameters: Parameters::new(FIFI_LS_DEFAULTS.clone()),
            basehead: None,
        }
    }
}

impl Default for FifiLsParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HeaderSource> FifiLsParameters<H> {
    /// Library defaults plus a baseline observation header.
    pub fn with_basehead(basehead: H) -> Self {
        FifiLsParameters {
            parameters: Parameters::new(FIFI_LS_DEFAULTS.clone()),
            basehead: Some(basehead),
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }
    pub fn into_parameters(self) -> Parameters {
        self.parameters
    }

    pub fn basehead(&self) -> Option<&H> {
        self.basehead.as_ref()
    }
    pub fn basehead_mut(&mut self) -> Option<&mut H> {
        self.basehead.as_mut()
    }

    /// Adjusts the resample step at `step_index` for the detector
    /// channel named by the DETCHAN header card. The blue channel maps
    /// to a 1.5 arcsec output pixel, the red channel to 3.0 arcsec.
    /// Without a header, or for an unrecognized channel, the declared
    /// defaults stay in place.
    pub fn resample(&mut self, step_index: usize) {
        if let Some(basehead) = self.basehead.as_ref() {
            let channel = basehead
                .get_card("DETCHAN")
                .unwrap_or_else(|| "UNKNOWN".to_string());
            let pixel_size = match channel.trim().to_uppercase().as_str() {
                "BLUE" => Some(1.5),
                "RED" => Some(3.0),
                _ => None,
            };
            match pixel_size {
                Some(size) => {
                    debug!("Channel {} sets xy_pixel_size to {}", channel.trim(), size);
                    self.parameters.current_mut()[step_index].set_value("xy_pixel_size", size);
                }
                None => debug!("No pixel size override for channel '{}'", channel),
            }
        }
    }
}

impl<H: HeaderSource> From<FifiLsParameters<H>> for Parameters {
    fn from(fifi: FifiLsParameters<H>) -> Self {
        fifi.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE: [&str; 14] = [
        "checkhead",
        "split_grating_and_chop",
        "fit_ramps",
        "subtract_chops",
        "combine_nods",
        "lambda_calibrate",
        "spatial_calibrate",
        "apply_static_flat",
        "combine_grating_scans",
        "telluric_correct",
        "flux_calibrate",
        "correct_wave_shift",
        "resample",
        "specmap",
    ];
    const RESAMPLE_INDEX: usize = 12;

    fn configured(basehead: ObsHeader) -> FifiLsParameters {
        let mut fifi = FifiLsParameters::with_basehead(basehead);
        for step in RECIPE {
            fifi.parameters_mut().add_current_parameters(step);
        }
        fifi
    }

    #[test]
    fn default_table_is_well_formed() -> anyhow::Result<()> {
        let registry = &*FIFI_LS_DEFAULTS;

        assert_eq!(registry.len(), RECIPE.len());
        for name in RECIPE {
            assert!(registry.step_by_name(name).is_some(), "missing step {}", name);
        }
        registry.validate()
    }

    #[test]
    fn resample_defaults_match_the_published_table() {
        let step = FIFI_LS_DEFAULTS.step_by_name("resample").unwrap();
        assert_eq!(step.parameters.len(), 33);

        for key in ["general_params", "otf_params", "spatial_params", "spec_params"] {
            let group = step.parameters.iter().find(|p| p.key == key).unwrap();
            assert_eq!(group.wtype, Wtype::Group);
            assert!(group.value.is_empty());
        }

        let pixel_size = step.parameters.iter().find(|p| p.key == "xy_pixel_size").unwrap();
        assert!(pixel_size.value.is_empty());
        assert_eq!(pixel_size.dtype, Dtype::Float);

        let window = step.parameters.iter().find(|p| p.key == "w_window").unwrap();
        assert_eq!(window.value, ParamValue::Float(0.50));

        let fitthresh = step.parameters.iter().find(|p| p.key == "fitthresh").unwrap();
        assert_eq!(fitthresh.value, ParamValue::Float(-1.0));
    }

    #[test]
    fn parallel_is_hidden_where_work_does_not_split() {
        let registry = &*FIFI_LS_DEFAULTS;

        let chops = registry.step_by_name("subtract_chops").unwrap();
        assert!(chops.parameters.iter().find(|p| p.key == "parallel").unwrap().hidden);

        let ramps = registry.step_by_name("fit_ramps").unwrap();
        assert!(!ramps.parameters.iter().find(|p| p.key == "parallel").unwrap().hidden);
        assert_eq!(ramps.parameters.len(), 8);

        // nod combination and header validation have no parallel switch
        let nods = registry.step_by_name("combine_nods").unwrap();
        assert!(nods.parameters.iter().all(|p| p.key != "parallel"));
        let checkhead = registry.step_by_name("checkhead").unwrap();
        assert_eq!(checkhead.parameters.len(), 1);
    }

    #[test]
    fn enumerated_defaults_resolve_to_the_selected_option() {
        let fifi = configured(ObsHeader::default());
        let current = fifi.parameters().current();

        let nods = &current[4];
        assert_eq!(
            nods.get_value("b_nod_method"),
            Some(&ParamValue::Str("nearest".to_string()))
        );
        let spatial = &current[6];
        assert_eq!(
            spatial.get_value("flipsign"),
            Some(&ParamValue::Str("default".to_string()))
        );
        let resample = &current[RESAMPLE_INDEX];
        assert_eq!(
            resample.get_value("adaptive_algorithm"),
            Some(&ParamValue::Str("none".to_string()))
        );
        let specmap = &current[13];
        assert_eq!(
            specmap.get_value("slice_method"),
            Some(&ParamValue::Str("reference".to_string()))
        );
        assert_eq!(
            specmap.get_value("point_method"),
            Some(&ParamValue::Str("peak".to_string()))
        );
    }

    #[test]
    fn blue_channel_sets_the_spatial_pixel_size() {
        let mut fifi = configured(ObsHeader::from([("DETCHAN", "BLUE")]));
        fifi.resample(RESAMPLE_INDEX);

        assert_eq!(
            fifi.parameters().current()[RESAMPLE_INDEX].get_value("xy_pixel_size"),
            Some(&ParamValue::Float(1.5))
        );
    }

    #[test]
    fn red_channel_overrides_regardless_of_case_and_padding() {
        let mut fifi = configured(ObsHeader::from([("DETCHAN", "  red  ")]));
        fifi.resample(RESAMPLE_INDEX);

        assert_eq!(
            fifi.parameters().current()[RESAMPLE_INDEX].get_value("xy_pixel_size"),
            Some(&ParamValue::Float(3.0))
        );
    }

    #[test]
    fn unknown_or_missing_channel_keeps_the_default() {
        common::setup_logging("debug");

        let mut unknown = configured(ObsHeader::from([("DETCHAN", "GREEN")]));
        unknown.resample(RESAMPLE_INDEX);
        assert!(unknown.parameters().current()[RESAMPLE_INDEX]
            .get_value("xy_pixel_size")
            .unwrap()
            .is_empty());

        let mut bare = configured(ObsHeader::default());
        bare.resample(RESAMPLE_INDEX);
        assert!(bare.parameters().current()[RESAMPLE_INDEX]
            .get_value("xy_pixel_size")
            .unwrap()
            .is_empty());

        let mut headerless = FifiLsParameters::new();
        for step in RECIPE {
            headerless.parameters_mut().add_current_parameters(step);
        }
        headerless.resample(RESAMPLE_INDEX);
        assert!(headerless.parameters().current()[RESAMPLE_INDEX]
            .get_value("xy_pixel_size")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn a_plain_map_can_stand_in_for_the_header() {
        let mut map = hashbrown::HashMap::new();
        map.insert("DETCHAN".to_string(), "BLUE".to_string());

        let mut fifi = FifiLsParameters::with_basehead(map);
        fifi.parameters_mut().add_current_parameters("resample");
        fifi.resample(0);

        assert_eq!(
            fifi.parameters().current()[0].get_value("xy_pixel_size"),
            Some(&ParamValue::Float(1.5))
        );
    }

    #[test]
    fn copies_are_isolated() {
        let mut original = configured(ObsHeader::from([("DETCHAN", "BLUE")]));

        let mut copy = original.clone();
        copy.basehead_mut().unwrap().insert("DETCHAN", "RED");
        copy.parameters_mut().current_mut()[RESAMPLE_INDEX].set_value("xy_window", 6.0);

        copy.resample(RESAMPLE_INDEX);
        original.resample(RESAMPLE_INDEX);

        let copied = &copy.parameters().current()[RESAMPLE_INDEX];
        assert_eq!(copied.get_value("xy_pixel_size"), Some(&ParamValue::Float(3.0)));
        assert_eq!(copied.get_value("xy_window"), Some(&ParamValue::Float(6.0)));

        let kept = &original.parameters().current()[RESAMPLE_INDEX];
        assert_eq!(kept.get_value("xy_pixel_size"), Some(&ParamValue::Float(1.5)));
        assert_eq!(kept.get_value("xy_window"), Some(&ParamValue::Float(3.0)));
        assert_eq!(
            original.basehead().unwrap().get_card("DETCHAN"),
            Some("BLUE".to_string())
        );
    }

    #[test]
    fn instance_changes_never_touch_the_shared_defaults() {
        let before = FIFI_LS_DEFAULTS.to_yaml();

        let mut fifi = configured(ObsHeader::from([("DETCHAN", "RED")]));
        fifi.resample(RESAMPLE_INDEX);
        fifi.parameters_mut().current_mut()[2].set_value("s2n", -1.0);

        assert_eq!(FIFI_LS_DEFAULTS.to_yaml(), before);
    }

    #[test]
    fn full_parameter_state_round_trips_through_yaml() -> anyhow::Result<()> {
        let fifi = configured(ObsHeader::default());

        let yaml = fifi.parameters().to_yaml();
        let reloaded = Parameters::from_yaml(&yaml)?;

        assert_eq!(yaml, reloaded.to_yaml());
        Ok(())
    }
}
